//! Flutter bridge crate for IdeaPile core.
//!
//! Dart bindings are generated from the `api` module by
//! `flutter_rust_bridge_codegen`.

pub mod api;
