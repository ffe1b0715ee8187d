//! Idea use-case service.
//!
//! # Responsibility
//! - Provide the capture/list/search/favorite/delete APIs used by screens.
//! - Assign fresh ids and creation timestamps.
//! - Translate repository failures into the user-facing error taxonomy.
//!
//! # Invariants
//! - A newly added idea never reuses a live or retired id.
//! - `add` with blank content never touches storage.
//! - Every mutation is committed before `Ok` is returned.
//! - Log events carry ids and counts only, never idea text.

use crate::model::clock::{Clock, SystemClock};
use crate::model::idea::{normalize_tags, Idea, IdeaId, IdeaValidationError};
use crate::repo::idea_repo::{IdeaListQuery, IdeaRepository, RepoError};
use crate::search::matcher::{search_ideas, SearchQuery};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MAX_ID_ATTEMPTS: usize = 8;

pub type ServiceResult<T> = Result<T, IdeaServiceError>;

/// Coarse error category shown to UI callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdeaErrorKind {
    NotFound,
    Validation,
    Conflict,
    StorageUnavailable,
    Internal,
}

impl IdeaErrorKind {
    /// Stable snake_case label used across the FFI boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::StorageUnavailable => "storage_unavailable",
            Self::Internal => "internal",
        }
    }
}

/// Service error for idea use-cases.
#[derive(Debug)]
pub enum IdeaServiceError {
    /// Input rejected before persistence.
    Validation(IdeaValidationError),
    /// Target idea does not exist.
    NotFound(IdeaId),
    /// Imported id is live or retired.
    IdConflict(IdeaId),
    /// Imported AI expansion id is already stored.
    ExpansionConflict(Uuid),
    /// Persistence-layer failure.
    StorageUnavailable(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl IdeaServiceError {
    pub fn kind(&self) -> IdeaErrorKind {
        match self {
            Self::Validation(_) => IdeaErrorKind::Validation,
            Self::NotFound(_) => IdeaErrorKind::NotFound,
            Self::IdConflict(_) | Self::ExpansionConflict(_) => IdeaErrorKind::Conflict,
            Self::StorageUnavailable(_) => IdeaErrorKind::StorageUnavailable,
            Self::InconsistentState(_) => IdeaErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Storage failures may succeed when the caller retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl Display for IdeaServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "idea not found: {id}"),
            Self::IdConflict(id) => write!(f, "idea id is not available: {id}"),
            Self::ExpansionConflict(id) => write!(f, "ai expansion id is not available: {id}"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent idea state: {details}"),
        }
    }
}

impl Error for IdeaServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StorageUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdeaValidationError> for IdeaServiceError {
    fn from(value: IdeaValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for IdeaServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::DuplicateId(id) | RepoError::RetiredId(id) => Self::IdConflict(id),
            RepoError::DuplicateExpansionId(id) => Self::ExpansionConflict(id),
            other => Self::StorageUnavailable(other),
        }
    }
}

/// Idea service facade over repository implementations.
pub struct IdeaService<R: IdeaRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: IdeaRepository> IdeaService<R, SystemClock> {
    /// Creates a service stamping ideas with wall-clock time.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: IdeaRepository, C: Clock> IdeaService<R, C> {
    /// Creates a service with an explicit time source.
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Captures one idea.
    ///
    /// # Contract
    /// - Rejects blank content with `Validation` before any storage access.
    /// - Normalizes tags (trim, drop blanks, case-insensitive dedupe).
    /// - Returns the persisted record read back from storage.
    pub fn add(&mut self, content: impl Into<String>, tags: &[String]) -> ServiceResult<Idea> {
        let timestamp = self.clock.now_epoch_ms();
        let mut idea = Idea::new(content, tags, timestamp)?;

        let mut attempts = 1;
        while self.repo.is_id_taken(idea.id)? {
            if attempts >= MAX_ID_ATTEMPTS {
                warn!(
                    "event=idea_add module=service status=error error_code=id_exhausted attempts={}",
                    attempts
                );
                return Err(IdeaServiceError::InconsistentState(
                    "could not allocate an unused idea id",
                ));
            }
            idea.id = Uuid::new_v4();
            attempts += 1;
        }

        let id = self.repo.create_idea(&idea)?;
        info!(
            "event=idea_add module=service status=ok idea_id={} tag_count={}",
            id,
            idea.tags.len()
        );
        self.repo
            .get_idea(id)?
            .ok_or(IdeaServiceError::InconsistentState(
                "created idea not found in read-back",
            ))
    }

    /// Persists an externally produced record, e.g. from a sync import.
    ///
    /// AI expansions are stored as given. Connection targets that were
    /// already deleted are dropped, so the stored list may be shorter than
    /// the input.
    pub fn import_idea(&mut self, mut idea: Idea) -> ServiceResult<Idea> {
        idea.tags = normalize_tags(&idea.tags);
        let id = self.repo.create_idea(&idea)?;
        info!(
            "event=idea_import module=service status=ok idea_id={} connection_count={} expansion_count={}",
            id,
            idea.connection_ids().len(),
            idea.expansions().len()
        );
        self.repo
            .get_idea(id)?
            .ok_or(IdeaServiceError::InconsistentState(
                "imported idea not found in read-back",
            ))
    }

    /// Gets one idea by id. A missing id is `Ok(None)`.
    pub fn get_by_id(&self, id: IdeaId) -> ServiceResult<Option<Idea>> {
        Ok(self.repo.get_idea(id)?)
    }

    /// Lists all ideas newest first.
    pub fn list(&self) -> ServiceResult<Vec<Idea>> {
        self.list_filtered(&IdeaListQuery::default())
    }

    /// Re-reads the full list; used by pull-to-refresh and retry.
    pub fn refresh(&self) -> ServiceResult<Vec<Idea>> {
        let ideas = self.list()?;
        debug!(
            "event=idea_refresh module=service status=ok count={}",
            ideas.len()
        );
        Ok(ideas)
    }

    /// Lists ideas using tag and favorite filters.
    pub fn list_filtered(&self, query: &IdeaListQuery) -> ServiceResult<Vec<Idea>> {
        Ok(self.repo.list_ideas(query)?)
    }

    /// Case-insensitive substring search over content and tags.
    ///
    /// A blank or whitespace-only query behaves like [`IdeaService::list`].
    /// Any other query is matched untrimmed, so surrounding spaces are part
    /// of the needle.
    pub fn search(&self, text: &str) -> ServiceResult<Vec<Idea>> {
        self.search_with(&SearchQuery::new(text))
    }

    /// Search with explicit options.
    pub fn search_with(&self, query: &SearchQuery) -> ServiceResult<Vec<Idea>> {
        let hits = search_ideas(&self.repo, query)?;
        debug!(
            "event=idea_search module=service status=ok query_chars={} hit_count={}",
            query.text.chars().count(),
            hits.len()
        );
        Ok(hits)
    }

    /// Flips the favorite flag and returns the updated record.
    pub fn toggle_favorite(&mut self, id: IdeaId) -> ServiceResult<Idea> {
        let is_favorite = self.repo.toggle_favorite(id)?;
        info!(
            "event=idea_toggle_favorite module=service status=ok idea_id={} is_favorite={}",
            id, is_favorite
        );
        self.repo
            .get_idea(id)?
            .ok_or(IdeaServiceError::InconsistentState(
                "idea missing after favorite toggle",
            ))
    }

    /// Permanently deletes one idea and retires its id.
    pub fn delete(&mut self, id: IdeaId) -> ServiceResult<()> {
        let retired_at = self.clock.now_epoch_ms();
        match self.repo.delete_idea(id, retired_at) {
            Ok(()) => {
                info!("event=idea_delete module=service status=ok idea_id={id}");
                Ok(())
            }
            Err(RepoError::NotFound(missing)) => {
                debug!("event=idea_delete module=service status=not_found idea_id={missing}");
                Err(IdeaServiceError::NotFound(missing))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Lists distinct tags known by storage.
    pub fn list_tags(&self) -> ServiceResult<Vec<String>> {
        Ok(self.repo.list_tags()?)
    }
}
