use ideapile_core::db::{open_db, open_db_in_memory};
use ideapile_core::{
    AiExpansion, FixedClock, Idea, IdeaErrorKind, IdeaListQuery, IdeaService, IdeaServiceError,
    IdeaValidationError, SqliteIdeaRepository,
};
use std::collections::HashSet;
use uuid::Uuid;

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn capture_favorite_delete_scenario() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);

    let idea = service.add("Buy milk", &tags(&["errand"])).unwrap();
    assert_eq!(idea.content, "Buy milk");
    assert_eq!(idea.tags, tags(&["errand"]));
    assert!(!idea.is_favorite);

    let listed = service.list().unwrap();
    assert_eq!(listed, vec![idea.clone()]);

    let favored = service.toggle_favorite(idea.id).unwrap();
    assert!(favored.is_favorite);
    assert_eq!(favored.timestamp, idea.timestamp);

    service.delete(idea.id).unwrap();
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn add_assigns_unique_ids_and_past_timestamps() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);

    let mut ids = HashSet::new();
    for idx in 0..25 {
        let idea = service.add(format!("idea {idx}"), &[]).unwrap();
        assert!(idea.timestamp <= chrono::Utc::now().timestamp_millis());
        assert!(service.get_by_id(idea.id).unwrap().is_some());
        assert!(ids.insert(idea.id));
    }
    assert_eq!(service.list().unwrap().len(), 25);
}

#[test]
fn add_with_blank_content_fails_without_mutation() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);
    service.add("keep me", &[]).unwrap();

    for content in ["", "   ", "\n\t"] {
        let err = service.add(content, &tags(&["x"])).unwrap_err();
        assert!(matches!(
            err,
            IdeaServiceError::Validation(IdeaValidationError::EmptyContent)
        ));
        assert_eq!(err.kind(), IdeaErrorKind::Validation);
        assert!(!err.is_retryable());
    }

    assert_eq!(service.list().unwrap().len(), 1);
    assert_eq!(service.list_tags().unwrap(), Vec::<String>::new());
}

#[test]
fn add_normalizes_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);

    let idea = service
        .add("tagged", &tags(&[" Work ", "", "work", "Focus"]))
        .unwrap();
    assert_eq!(idea.tags, tags(&["Work", "Focus"]));
}

#[test]
fn toggle_favorite_twice_restores_original_value() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);
    let idea = service.add("flip", &[]).unwrap();

    service.toggle_favorite(idea.id).unwrap();
    let restored = service.toggle_favorite(idea.id).unwrap();
    assert_eq!(restored, idea);
}

#[test]
fn missing_ids_are_not_found_outcomes() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);
    let missing = Uuid::new_v4();

    assert!(service.get_by_id(missing).unwrap().is_none());

    let toggle_err = service.toggle_favorite(missing).unwrap_err();
    assert!(toggle_err.is_not_found());
    assert_eq!(toggle_err.kind().as_str(), "not_found");

    let delete_err = service.delete(missing).unwrap_err();
    assert!(matches!(delete_err, IdeaServiceError::NotFound(id) if id == missing));
}

#[test]
fn delete_then_get_is_not_found_and_second_delete_reports_it() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);
    let idea = service.add("short lived", &[]).unwrap();

    service.delete(idea.id).unwrap();
    assert!(service.get_by_id(idea.id).unwrap().is_none());
    assert!(service.delete(idea.id).unwrap_err().is_not_found());
}

#[test]
fn retired_id_cannot_be_imported_again() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);
    let idea = service.add("to retire", &[]).unwrap();
    service.delete(idea.id).unwrap();

    let err = service.import_idea(idea.clone()).unwrap_err();
    assert!(matches!(err, IdeaServiceError::IdConflict(id) if id == idea.id));
    assert_eq!(err.kind(), IdeaErrorKind::Conflict);
}

#[test]
fn import_roundtrips_expansions_and_connections() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::with_clock(repo, FixedClock(5_000));

    let anchor = service.add("anchor", &[]).unwrap();
    let mut imported = Idea::with_id(
        Uuid::new_v4(),
        "imported from sync",
        &tags(&["sync"]),
        4_000,
    )
    .unwrap();
    imported.is_favorite = true;
    imported.connections = Some(vec![anchor.id]);
    imported.ai_expansions = Some(vec![AiExpansion {
        id: Uuid::new_v4(),
        kind: "summary".to_string(),
        content: "a short summary".to_string(),
        timestamp: 4_500,
    }]);

    let stored = service.import_idea(imported.clone()).unwrap();
    assert_eq!(stored, imported);

    let listed = service.list().unwrap();
    assert_eq!(listed[0].id, anchor.id);
    assert_eq!(listed[1].id, imported.id);
}

#[test]
fn import_rejects_invalid_expansion() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);

    let mut idea = Idea::new("bad expansion", &[], 1_000).unwrap();
    let expansion_id = Uuid::new_v4();
    idea.ai_expansions = Some(vec![AiExpansion {
        id: expansion_id,
        kind: " ".to_string(),
        content: "text".to_string(),
        timestamp: 1_000,
    }]);

    let err = service.import_idea(idea).unwrap_err();
    assert!(matches!(
        err,
        IdeaServiceError::Validation(IdeaValidationError::InvalidExpansion(id)) if id == expansion_id
    ));
    assert!(service.list().unwrap().is_empty());
}

fn expansion(id: Uuid, content: &str) -> AiExpansion {
    AiExpansion {
        id,
        kind: "summary".to_string(),
        content: content.to_string(),
        timestamp: 1_500,
    }
}

#[test]
fn reused_expansion_id_is_a_conflict_not_a_storage_failure() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);
    let shared = Uuid::new_v4();

    let mut first = Idea::new("first import", &[], 1_000).unwrap();
    first.ai_expansions = Some(vec![expansion(shared, "one")]);
    service.import_idea(first.clone()).unwrap();

    let mut second = Idea::new("second import", &[], 2_000).unwrap();
    second.ai_expansions = Some(vec![expansion(shared, "two")]);
    let err = service.import_idea(second.clone()).unwrap_err();

    assert!(matches!(err, IdeaServiceError::ExpansionConflict(id) if id == shared));
    assert_eq!(err.kind(), IdeaErrorKind::Conflict);
    assert!(!err.is_retryable());
    assert!(service.get_by_id(second.id).unwrap().is_none());
    assert_eq!(service.list().unwrap().len(), 1);
}

#[test]
fn repeated_expansion_id_within_one_record_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);
    let repeated = Uuid::new_v4();

    let mut idea = Idea::new("twice expanded", &[], 1_000).unwrap();
    idea.ai_expansions = Some(vec![expansion(repeated, "one"), expansion(repeated, "two")]);

    let err = service.import_idea(idea).unwrap_err();
    assert!(matches!(
        err,
        IdeaServiceError::Validation(IdeaValidationError::DuplicateExpansion(id)) if id == repeated
    ));
    assert!(!err.is_retryable());
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn import_drops_connections_to_deleted_ideas() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::with_clock(repo, FixedClock(3_000));

    let gone = service.add("deleted before import", &[]).unwrap();
    let kept = service.add("still here", &[]).unwrap();
    service.delete(gone.id).unwrap();

    let mut imported = Idea::new("imported later", &[], 2_000).unwrap();
    imported.connections = Some(vec![gone.id]);
    let stored = service.import_idea(imported.clone()).unwrap();
    assert_eq!(stored.connections, Some(Vec::new()));

    let mut mixed = Idea::new("mixed links", &[], 2_500).unwrap();
    mixed.connections = Some(vec![gone.id, kept.id]);
    let stored = service.import_idea(mixed).unwrap();
    assert_eq!(stored.connections, Some(vec![kept.id]));
}

#[test]
fn list_filtered_and_refresh_agree_with_list() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let mut service = IdeaService::new(repo);
    let first = service.add("first", &tags(&["a"])).unwrap();
    service.add("second", &tags(&["b"])).unwrap();
    service.toggle_favorite(first.id).unwrap();

    assert_eq!(service.refresh().unwrap(), service.list().unwrap());

    let favorites = service
        .list_filtered(&IdeaListQuery {
            tag: None,
            favorites_only: true,
        })
        .unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, first.id);
}

#[test]
fn acknowledged_writes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ideapile.db");

    let (kept, deleted) = {
        let mut conn = open_db(&path).unwrap();
        let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
        let mut service = IdeaService::new(repo);
        let kept = service.add("persist me", &tags(&["durable"])).unwrap();
        let deleted = service.add("remove me", &[]).unwrap();
        service.toggle_favorite(kept.id).unwrap();
        service.delete(deleted.id).unwrap();
        (kept, deleted)
    };

    let mut conn = open_db(&path).unwrap();
    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let service = IdeaService::new(repo);

    let listed = service.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, kept.id);
    assert!(listed[0].is_favorite);
    assert_eq!(listed[0].timestamp, kept.timestamp);
    assert!(service.get_by_id(deleted.id).unwrap().is_none());
}

#[test]
fn storage_failures_surface_as_retryable() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE idea_tags;").unwrap();
    // Re-add a table with the right name but the wrong shape.
    conn.execute_batch("CREATE TABLE idea_tags (unrelated INTEGER);")
        .unwrap();
    conn.execute(
        "INSERT INTO ideas (id, content, created_at) VALUES (?1, 'x', 1);",
        [Uuid::new_v4().to_string()],
    )
    .unwrap();

    let repo = SqliteIdeaRepository::try_new(&mut conn).unwrap();
    let service = IdeaService::new(repo);
    let err = service.list().unwrap_err();
    assert_eq!(err.kind(), IdeaErrorKind::StorageUnavailable);
    assert!(err.is_retryable());
}
