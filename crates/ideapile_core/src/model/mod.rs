//! Domain model for captured ideas.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every idea is identified by a stable `IdeaId`.
//! - Deletion is permanent; deleted ids are retired, never reused.

pub mod clock;
pub mod idea;
