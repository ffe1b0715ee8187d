//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the idea data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Idea::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `RetiredId`) in
//!   addition to DB transport errors.

pub mod idea_repo;
