//! Idea search entry points.
//!
//! # Responsibility
//! - Case-insensitive substring filtering over idea content and tags.
//! - Keep search result shaping inside core.

pub mod matcher;
