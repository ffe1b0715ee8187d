//! Idea domain model.
//!
//! # Responsibility
//! - Define the canonical idea record shown by list/detail screens.
//! - Own content/tag normalization and record validation.
//!
//! # Invariants
//! - `id` is stable and never reused for another idea, even after deletion.
//! - `timestamp` is stamped once at creation and never mutated.
//! - `content` is never blank.
//! - `tags` keep first-occurrence order and contain no blank or
//!   case-insensitive duplicate values.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every captured idea.
pub type IdeaId = Uuid;

/// Validation failures for idea records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdeaValidationError {
    /// Idea content is empty or whitespace-only.
    EmptyContent,
    /// Nil UUID is not a valid idea identity.
    NilId,
    /// Timestamp must be a non-negative epoch millisecond value.
    InvalidTimestamp(i64),
    /// An AI expansion is missing required text fields.
    InvalidExpansion(Uuid),
    /// Two expansions of one idea share an id.
    DuplicateExpansion(Uuid),
    /// An idea cannot be connected to itself.
    SelfConnection(IdeaId),
}

impl Display for IdeaValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "idea content cannot be empty"),
            Self::NilId => write!(f, "idea id cannot be nil"),
            Self::InvalidTimestamp(value) => write!(f, "invalid idea timestamp `{value}`"),
            Self::InvalidExpansion(id) => {
                write!(f, "ai expansion {id} requires non-empty type and content")
            }
            Self::DuplicateExpansion(id) => {
                write!(f, "ai expansion id {id} appears more than once")
            }
            Self::SelfConnection(id) => write!(f, "idea {id} cannot connect to itself"),
        }
    }
}

impl Error for IdeaValidationError {}

/// AI-generated elaboration attached to an idea.
///
/// Populated by external collaborators; core only stores and returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiExpansion {
    pub id: Uuid,
    /// Expansion category label, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

/// Canonical idea record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: IdeaId,
    /// Free text body as typed by the user.
    pub content: String,
    /// Display-ordered tags.
    pub tags: Vec<String>,
    /// Creation time in Unix epoch milliseconds.
    pub timestamp: i64,
    pub is_favorite: bool,
    /// Related idea ids. `None` when the idea never had connections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<IdeaId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_expansions: Option<Vec<AiExpansion>>,
}

impl Idea {
    /// Creates a new idea with a generated stable ID.
    ///
    /// Tags are normalized; `is_favorite` starts as `false`.
    pub fn new(
        content: impl Into<String>,
        tags: &[String],
        timestamp: i64,
    ) -> Result<Self, IdeaValidationError> {
        Self::with_id(Uuid::new_v4(), content, tags, timestamp)
    }

    /// Creates an idea with a caller-provided stable ID.
    ///
    /// Used by import paths and by id regeneration when a fresh id collides
    /// with a retired one.
    pub fn with_id(
        id: IdeaId,
        content: impl Into<String>,
        tags: &[String],
        timestamp: i64,
    ) -> Result<Self, IdeaValidationError> {
        let idea = Self {
            id,
            content: content.into(),
            tags: normalize_tags(tags),
            timestamp,
            is_favorite: false,
            connections: None,
            ai_expansions: None,
        };
        idea.validate()?;
        Ok(idea)
    }

    /// Validates record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), IdeaValidationError> {
        if self.id.is_nil() {
            return Err(IdeaValidationError::NilId);
        }
        if self.content.trim().is_empty() {
            return Err(IdeaValidationError::EmptyContent);
        }
        if self.timestamp < 0 {
            return Err(IdeaValidationError::InvalidTimestamp(self.timestamp));
        }
        if let Some(connections) = &self.connections {
            if connections.contains(&self.id) {
                return Err(IdeaValidationError::SelfConnection(self.id));
            }
        }
        if let Some(expansions) = &self.ai_expansions {
            let mut expansion_ids = HashSet::with_capacity(expansions.len());
            for expansion in expansions {
                if !expansion_ids.insert(expansion.id) {
                    return Err(IdeaValidationError::DuplicateExpansion(expansion.id));
                }
                if expansion.id.is_nil()
                    || expansion.kind.trim().is_empty()
                    || expansion.content.trim().is_empty()
                {
                    return Err(IdeaValidationError::InvalidExpansion(expansion.id));
                }
                if expansion.timestamp < 0 {
                    return Err(IdeaValidationError::InvalidTimestamp(expansion.timestamp));
                }
            }
        }
        Ok(())
    }

    /// Flips the favorite flag and returns the new value.
    pub fn toggle_favorite(&mut self) -> bool {
        self.is_favorite = !self.is_favorite;
        self.is_favorite
    }

    /// Returns connection ids, empty when none were recorded.
    pub fn connection_ids(&self) -> &[IdeaId] {
        self.connections.as_deref().unwrap_or(&[])
    }

    /// Returns attached expansions, empty when none were recorded.
    pub fn expansions(&self) -> &[AiExpansion] {
        self.ai_expansions.as_deref().unwrap_or(&[])
    }
}

/// Normalizes one tag value. Returns `None` for blank input.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes tags keeping first-occurrence order and casing.
///
/// Duplicates are detected case-insensitively.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(tags.len());
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            if seen.insert(value.to_lowercase()) {
                normalized.push(value);
            }
        }
    }
    normalized
}
