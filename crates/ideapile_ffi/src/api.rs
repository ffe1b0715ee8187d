//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose idea capture/list/search/favorite/delete to Dart via FRB.
//! - Flatten core errors into stable envelopes with a retry hint.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - DB-backed functions are not `sync`, so FRB runs them off the UI thread.
//! - `error_kind` values are stable snake_case labels.

use ideapile_core::db::open_db;
use ideapile_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AiExpansion, Idea, IdeaId, IdeaService, IdeaServiceError, SqliteIdeaRepository,
    SEARCH_DEBOUNCE_MS,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const IDEA_DB_FILE_NAME: &str = "ideapile.sqlite3";
static IDEA_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Debounce window the search box should apply before calling `idea_search`.
#[flutter_rust_bridge::frb(sync)]
pub fn search_debounce_ms() -> u64 {
    SEARCH_DEBOUNCE_MS
}

/// AI expansion item returned to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiExpansionItem {
    pub id: String,
    pub kind: String,
    pub content: String,
    pub timestamp_ms: i64,
}

/// Idea item returned to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaItem {
    /// Stable idea ID in string form.
    pub id: String,
    pub content: String,
    /// Display-ordered tags.
    pub tags: Vec<String>,
    /// Creation time in epoch milliseconds.
    pub timestamp_ms: i64,
    pub is_favorite: bool,
    /// `None` when the idea never recorded connections.
    pub connections: Option<Vec<String>>,
    pub ai_expansions: Option<Vec<AiExpansionItem>>,
}

/// Failure details shared by every envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaFailure {
    /// `not_found|validation|conflict|storage_unavailable|internal`.
    pub error_kind: String,
    /// Whether the UI should offer a retry affordance.
    pub retryable: bool,
}

/// Response envelope for single-idea calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaResponse {
    pub ok: bool,
    /// Present for add/get/toggle on success.
    pub idea: Option<IdeaItem>,
    pub failure: Option<IdeaFailure>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl IdeaResponse {
    fn success(message: impl Into<String>, idea: Option<IdeaItem>) -> Self {
        Self {
            ok: true,
            idea,
            failure: None,
            message: message.into(),
        }
    }

    fn failure(operation: &str, err: &IdeaServiceError) -> Self {
        Self {
            ok: false,
            idea: None,
            failure: Some(to_failure(err)),
            message: format!("{operation} failed: {err}"),
        }
    }

    fn invalid_id(operation: &str, raw: &str) -> Self {
        Self {
            ok: false,
            idea: None,
            failure: Some(IdeaFailure {
                error_kind: "validation".to_string(),
                retryable: false,
            }),
            message: format!("{operation} failed: invalid idea id `{raw}`"),
        }
    }
}

/// Response envelope for list/search calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaListResponse {
    pub ok: bool,
    /// Newest first.
    pub items: Vec<IdeaItem>,
    pub failure: Option<IdeaFailure>,
    pub message: String,
}

impl IdeaListResponse {
    fn from_result(operation: &str, result: Result<Vec<Idea>, IdeaServiceError>) -> Self {
        match result {
            Ok(ideas) => {
                let items = ideas.into_iter().map(to_idea_item).collect::<Vec<_>>();
                let message = if items.is_empty() {
                    "No ideas.".to_string()
                } else {
                    format!("Found {} idea(s).", items.len())
                };
                Self {
                    ok: true,
                    items,
                    failure: None,
                    message,
                }
            }
            Err(err) => Self {
                ok: false,
                items: Vec::new(),
                failure: Some(to_failure(&err)),
                message: format!("{operation} failed: {err}"),
            },
        }
    }
}

/// Response envelope for tag listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagListResponse {
    pub ok: bool,
    pub tags: Vec<String>,
    pub failure: Option<IdeaFailure>,
    pub message: String,
}

/// Captures a new idea.
pub fn idea_add(content: String, tags: Vec<String>) -> IdeaResponse {
    match with_idea_service(|service| service.add(content, &tags)) {
        Ok(idea) => IdeaResponse::success("Idea saved.", Some(to_idea_item(idea))),
        Err(err) => IdeaResponse::failure("idea_add", &err),
    }
}

/// Loads one idea. A missing id is `ok=false` with `error_kind=not_found`.
pub fn idea_get(id: String) -> IdeaResponse {
    let Some(idea_id) = parse_idea_id(&id) else {
        return IdeaResponse::invalid_id("idea_get", &id);
    };
    match with_idea_service(|service| service.get_by_id(idea_id)) {
        Ok(Some(idea)) => IdeaResponse::success("Idea loaded.", Some(to_idea_item(idea))),
        Ok(None) => IdeaResponse::failure("idea_get", &IdeaServiceError::NotFound(idea_id)),
        Err(err) => IdeaResponse::failure("idea_get", &err),
    }
}

/// Lists all ideas newest first.
pub fn idea_list() -> IdeaListResponse {
    IdeaListResponse::from_result("idea_list", with_idea_service(|service| service.list()))
}

/// Re-reads the list for pull-to-refresh and error retry.
pub fn idea_refresh() -> IdeaListResponse {
    IdeaListResponse::from_result(
        "idea_refresh",
        with_idea_service(|service| service.refresh()),
    )
}

/// Searches content and tags; blank text behaves like `idea_list`.
pub fn idea_search(text: String) -> IdeaListResponse {
    IdeaListResponse::from_result(
        "idea_search",
        with_idea_service(|service| service.search(&text)),
    )
}

/// Flips the favorite flag and returns the updated idea.
pub fn idea_toggle_favorite(id: String) -> IdeaResponse {
    let Some(idea_id) = parse_idea_id(&id) else {
        return IdeaResponse::invalid_id("idea_toggle_favorite", &id);
    };
    match with_idea_service(|service| service.toggle_favorite(idea_id)) {
        Ok(idea) => IdeaResponse::success("Favorite updated.", Some(to_idea_item(idea))),
        Err(err) => IdeaResponse::failure("idea_toggle_favorite", &err),
    }
}

/// Permanently deletes one idea.
pub fn idea_delete(id: String) -> IdeaResponse {
    let Some(idea_id) = parse_idea_id(&id) else {
        return IdeaResponse::invalid_id("idea_delete", &id);
    };
    match with_idea_service(|service| service.delete(idea_id)) {
        Ok(()) => IdeaResponse::success("Idea deleted.", None),
        Err(err) => IdeaResponse::failure("idea_delete", &err),
    }
}

/// Lists distinct tags for tag suggestions.
pub fn idea_list_tags() -> TagListResponse {
    match with_idea_service(|service| service.list_tags()) {
        Ok(tags) => TagListResponse {
            ok: true,
            message: format!("Found {} tag(s).", tags.len()),
            tags,
            failure: None,
        },
        Err(err) => TagListResponse {
            ok: false,
            tags: Vec::new(),
            failure: Some(to_failure(&err)),
            message: format!("idea_list_tags failed: {err}"),
        },
    }
}

fn resolve_idea_db_path() -> PathBuf {
    IDEA_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("IDEAPILE_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(IDEA_DB_FILE_NAME)
        })
        .clone()
}

fn with_idea_service<T>(
    f: impl FnOnce(&mut IdeaService<SqliteIdeaRepository<'_>>) -> Result<T, IdeaServiceError>,
) -> Result<T, IdeaServiceError> {
    let db_path = resolve_idea_db_path();
    let mut conn = open_db(&db_path).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error error={err}");
        IdeaServiceError::StorageUnavailable(err.into())
    })?;
    let repo = SqliteIdeaRepository::try_new(&mut conn)?;
    let mut service = IdeaService::new(repo);
    f(&mut service)
}

fn parse_idea_id(raw: &str) -> Option<IdeaId> {
    Uuid::parse_str(raw.trim()).ok()
}

fn to_failure(err: &IdeaServiceError) -> IdeaFailure {
    IdeaFailure {
        error_kind: err.kind().as_str().to_string(),
        retryable: err.is_retryable(),
    }
}

fn to_idea_item(idea: Idea) -> IdeaItem {
    IdeaItem {
        id: idea.id.to_string(),
        content: idea.content,
        tags: idea.tags,
        timestamp_ms: idea.timestamp,
        is_favorite: idea.is_favorite,
        connections: idea
            .connections
            .map(|ids| ids.iter().map(Uuid::to_string).collect()),
        ai_expansions: idea
            .ai_expansions
            .map(|items| items.into_iter().map(to_expansion_item).collect()),
    }
}

fn to_expansion_item(expansion: AiExpansion) -> AiExpansionItem {
    AiExpansionItem {
        id: expansion.id.to_string(),
        kind: expansion.kind,
        content: expansion.content,
        timestamp_ms: expansion.timestamp,
    }
}
