//! Substring search over stored ideas.
//!
//! # Invariants
//! - Matching is case-insensitive using Unicode lowercase folding.
//! - A hit always contains the query in `content` or in at least one tag.
//! - A blank query returns exactly what listing returns, in the same order.
//! - Each call reads storage afresh; no state is carried between calls.

use crate::model::idea::Idea;
use crate::repo::idea_repo::{IdeaListQuery, IdeaRepository, RepoResult};

/// Search options for idea lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Raw user query text. Matched as typed: `" milk"` only hits text
    /// containing a space before `milk`. Whitespace-only text counts as blank.
    pub text: String,
    /// Restrict hits to favorites.
    pub favorites_only: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            favorites_only: false,
        }
    }

    /// Returns whether the query should fall back to a plain listing.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Lowercased needle compiled from one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaMatcher {
    needle: String,
}

impl IdeaMatcher {
    pub fn new(text: &str) -> Self {
        Self {
            needle: text.to_lowercase(),
        }
    }

    /// Returns whether the idea content or any tag contains the needle.
    pub fn matches(&self, idea: &Idea) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        idea.content.to_lowercase().contains(&self.needle)
            || idea
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&self.needle))
    }
}

/// Searches ideas newest first.
pub fn search_ideas<R: IdeaRepository + ?Sized>(
    repo: &R,
    query: &SearchQuery,
) -> RepoResult<Vec<Idea>> {
    let list_query = IdeaListQuery {
        tag: None,
        favorites_only: query.favorites_only,
    };
    let ideas = repo.list_ideas(&list_query)?;
    if query.is_blank() {
        return Ok(ideas);
    }

    let matcher = IdeaMatcher::new(&query.text);
    Ok(ideas
        .into_iter()
        .filter(|idea| matcher.matches(idea))
        .collect())
}
