//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `ideapile_core` linkage without the Flutter runtime.
//! - Run one capture/favorite/delete pass against an in-memory database.

use ideapile_core::db::open_db_in_memory;
use ideapile_core::{IdeaService, IdeaServiceError, SqliteIdeaRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("ideapile_core ping={}", ideapile_core::ping());
    println!("ideapile_core version={}", ideapile_core::core_version());

    match run_smoke() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_smoke() -> Result<(), IdeaServiceError> {
    let mut conn =
        open_db_in_memory().map_err(|err| IdeaServiceError::StorageUnavailable(err.into()))?;
    let repo = SqliteIdeaRepository::try_new(&mut conn)?;
    let mut service = IdeaService::new(repo);

    let idea = service.add("Buy milk", &["errand".to_string()])?;
    println!("add id={} tags={}", idea.id, idea.tags.join(","));
    println!("list count={}", service.list()?.len());

    let favored = service.toggle_favorite(idea.id)?;
    println!("toggle_favorite is_favorite={}", favored.is_favorite);

    service.delete(idea.id)?;
    println!("delete ok list count={}", service.list()?.len());
    Ok(())
}
