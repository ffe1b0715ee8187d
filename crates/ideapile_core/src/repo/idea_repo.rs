//! Idea repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist idea records with their tags, connections and AI expansions.
//! - Own favorite toggling and permanent deletion with id retirement.
//!
//! # Invariants
//! - Every write runs in one `IMMEDIATE` transaction and is committed before
//!   the call returns `Ok`.
//! - Retired ids (ideas that were deleted) are never accepted again, neither
//!   as an idea id nor as a connection target.
//! - AI expansion ids are unique across all ideas.
//! - Lists are ordered by `created_at DESC`, newest insertion first on ties.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::idea::{AiExpansion, Idea, IdeaId, IdeaValidationError};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const IDEA_SELECT_SQL: &str = "SELECT
    id,
    content,
    created_at,
    is_favorite,
    has_connections,
    has_expansions
FROM ideas";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for idea persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(IdeaValidationError),
    Db(DbError),
    NotFound(IdeaId),
    /// Id belongs to a live idea already.
    DuplicateId(IdeaId),
    /// Id belonged to a deleted idea and stays retired.
    RetiredId(IdeaId),
    /// AI expansion id is already stored under some idea.
    DuplicateExpansionId(Uuid),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "idea not found: {id}"),
            Self::DuplicateId(id) => write!(f, "idea id already exists: {id}"),
            Self::RetiredId(id) => write!(f, "idea id was retired by deletion: {id}"),
            Self::DuplicateExpansionId(id) => write!(f, "ai expansion id already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted idea data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdeaValidationError> for RepoError {
    fn from(value: IdeaValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter options for listing ideas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdeaListQuery {
    /// Optional single-tag filter, matched case-insensitively.
    pub tag: Option<String>,
    /// Only return ideas marked as favorite.
    pub favorites_only: bool,
}

/// Repository interface for idea storage.
pub trait IdeaRepository {
    /// Persists a fully-formed idea, including connections and expansions.
    fn create_idea(&mut self, idea: &Idea) -> RepoResult<IdeaId>;
    /// Gets one idea by id; `Ok(None)` when absent.
    fn get_idea(&self, id: IdeaId) -> RepoResult<Option<Idea>>;
    /// Lists ideas newest first.
    fn list_ideas(&self, query: &IdeaListQuery) -> RepoResult<Vec<Idea>>;
    /// Flips the favorite flag and returns the new value.
    fn toggle_favorite(&mut self, id: IdeaId) -> RepoResult<bool>;
    /// Permanently removes an idea and retires its id.
    fn delete_idea(&mut self, id: IdeaId, retired_at: i64) -> RepoResult<()>;
    /// Returns whether the id is used by a live idea or was retired.
    fn is_id_taken(&self, id: IdeaId) -> RepoResult<bool>;
    /// Returns distinct tags sorted case-insensitively.
    fn list_tags(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed idea repository.
pub struct SqliteIdeaRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteIdeaRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl IdeaRepository for SqliteIdeaRepository<'_> {
    fn create_idea(&mut self, idea: &Idea) -> RepoResult<IdeaId> {
        idea.validate()?;

        let id_text = idea.id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if id_is_retired(&tx, &id_text)? {
            return Err(RepoError::RetiredId(idea.id));
        }
        if idea_exists(&tx, &id_text)? {
            return Err(RepoError::DuplicateId(idea.id));
        }
        for expansion in idea.expansions() {
            if expansion_exists(&tx, &expansion.id.to_string())? {
                return Err(RepoError::DuplicateExpansionId(expansion.id));
            }
        }

        tx.execute(
            "INSERT INTO ideas (
                id,
                content,
                created_at,
                is_favorite,
                has_connections,
                has_expansions
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id_text.as_str(),
                idea.content.as_str(),
                idea.timestamp,
                bool_to_int(idea.is_favorite),
                bool_to_int(idea.connections.is_some()),
                bool_to_int(idea.ai_expansions.is_some()),
            ],
        )?;

        for (position, tag) in idea.tags.iter().enumerate() {
            tx.execute(
                "INSERT INTO idea_tags (idea_id, position, name) VALUES (?1, ?2, ?3);",
                params![id_text.as_str(), position as i64, tag.as_str()],
            )?;
        }

        let mut live_targets = Vec::with_capacity(idea.connection_ids().len());
        for target in idea.connection_ids() {
            let target_text = target.to_string();
            // Deleted ideas are dropped from connection lists, as in `delete_idea`.
            if !id_is_retired(&tx, &target_text)? {
                live_targets.push(target_text);
            }
        }
        for (position, target) in live_targets.iter().enumerate() {
            tx.execute(
                "INSERT INTO idea_connections (idea_id, position, target_id)
                 VALUES (?1, ?2, ?3);",
                params![id_text.as_str(), position as i64, target.as_str()],
            )?;
        }

        for (position, expansion) in idea.expansions().iter().enumerate() {
            tx.execute(
                "INSERT INTO ai_expansions (id, idea_id, position, kind, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    expansion.id.to_string(),
                    id_text.as_str(),
                    position as i64,
                    expansion.kind.as_str(),
                    expansion.content.as_str(),
                    expansion.timestamp,
                ],
            )?;
        }

        tx.commit()?;
        Ok(idea.id)
    }

    fn get_idea(&self, id: IdeaId) -> RepoResult<Option<Idea>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{IDEA_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(load_idea(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_ideas(&self, query: &IdeaListQuery) -> RepoResult<Vec<Idea>> {
        let mut sql = format!("{IDEA_SELECT_SQL} WHERE 1 = 1");
        if query.favorites_only {
            sql.push_str(" AND is_favorite = 1");
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC;");

        let wanted_tag = query
            .tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_lowercase);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut ideas = Vec::new();
        while let Some(row) = rows.next()? {
            let idea = load_idea(self.conn, row)?;
            if let Some(wanted) = wanted_tag.as_deref() {
                if !idea.tags.iter().any(|tag| tag.to_lowercase() == wanted) {
                    continue;
                }
            }
            ideas.push(idea);
        }
        Ok(ideas)
    }

    fn toggle_favorite(&mut self, id: IdeaId) -> RepoResult<bool> {
        let id_text = id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE ideas SET is_favorite = 1 - is_favorite WHERE id = ?1;",
            [id_text.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let flag: i64 = tx.query_row(
            "SELECT is_favorite FROM ideas WHERE id = ?1;",
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        let is_favorite = int_to_bool(flag, "ideas.is_favorite")?;
        tx.commit()?;
        Ok(is_favorite)
    }

    fn delete_idea(&mut self, id: IdeaId, retired_at: i64) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Tags, outgoing connections and expansions cascade via foreign keys.
        let changed = tx.execute("DELETE FROM ideas WHERE id = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.execute(
            "DELETE FROM idea_connections WHERE target_id = ?1;",
            [id_text.as_str()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO retired_ids (id, retired_at) VALUES (?1, ?2);",
            params![id_text.as_str(), retired_at],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn is_id_taken(&self, id: IdeaId) -> RepoResult<bool> {
        let taken: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM ideas WHERE id = ?1)
                 OR EXISTS(SELECT 1 FROM retired_ids WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(taken == 1)
    }

    fn list_tags(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name
             FROM idea_tags
             ORDER BY name COLLATE NOCASE ASC, name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut seen = HashSet::new();
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            if seen.insert(value.to_lowercase()) {
                tags.push(value);
            }
        }
        Ok(tags)
    }
}

fn load_idea(conn: &Connection, row: &Row<'_>) -> RepoResult<Idea> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "ideas.id")?;
    let has_connections = int_to_bool(row.get("has_connections")?, "ideas.has_connections")?;
    let has_expansions = int_to_bool(row.get("has_expansions")?, "ideas.has_expansions")?;

    let idea = Idea {
        id,
        content: row.get("content")?,
        tags: load_tags(conn, &id_text)?,
        timestamp: row.get("created_at")?,
        is_favorite: int_to_bool(row.get("is_favorite")?, "ideas.is_favorite")?,
        connections: if has_connections {
            Some(load_connections(conn, &id_text)?)
        } else {
            None
        },
        ai_expansions: if has_expansions {
            Some(load_expansions(conn, &id_text)?)
        } else {
            None
        },
    };
    idea.validate()?;
    Ok(idea)
}

fn load_tags(conn: &Connection, idea_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM idea_tags WHERE idea_id = ?1 ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([idea_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn load_connections(conn: &Connection, idea_id: &str) -> RepoResult<Vec<IdeaId>> {
    let mut stmt = conn.prepare(
        "SELECT target_id FROM idea_connections WHERE idea_id = ?1 ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([idea_id])?;
    let mut targets = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        targets.push(parse_uuid(&value, "idea_connections.target_id")?);
    }
    Ok(targets)
}

fn load_expansions(conn: &Connection, idea_id: &str) -> RepoResult<Vec<AiExpansion>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, content, created_at
         FROM ai_expansions
         WHERE idea_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([idea_id])?;
    let mut expansions = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        expansions.push(AiExpansion {
            id: parse_uuid(&id_text, "ai_expansions.id")?,
            kind: row.get("kind")?,
            content: row.get("content")?,
            timestamp: row.get("created_at")?,
        });
    }
    Ok(expansions)
}

fn idea_exists(tx: &Transaction<'_>, id: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM ideas WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn expansion_exists(tx: &Transaction<'_>, id: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM ai_expansions WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn id_is_retired(tx: &Transaction<'_>, id: &str) -> RepoResult<bool> {
    let retired: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM retired_ids WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(retired == 1)
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in [
        "ideas",
        "idea_tags",
        "idea_connections",
        "ai_expansions",
        "retired_ids",
    ] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
