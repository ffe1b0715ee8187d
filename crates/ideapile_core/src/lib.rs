//! Core domain logic for IdeaPile.
//! This crate is the single source of truth for idea invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::clock::{Clock, FixedClock, SystemClock};
pub use model::idea::{normalize_tags, AiExpansion, Idea, IdeaId, IdeaValidationError};
pub use repo::idea_repo::{
    IdeaListQuery, IdeaRepository, RepoError, RepoResult, SqliteIdeaRepository,
};
pub use search::matcher::{search_ideas, IdeaMatcher, SearchQuery};
pub use service::idea_service::{IdeaErrorKind, IdeaService, IdeaServiceError, ServiceResult};

/// Caller-side debounce window for type-as-you-search, in milliseconds.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
