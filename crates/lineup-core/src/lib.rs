#![forbid(unsafe_code)]
//! lineup-core library.
//!
//! Orders namespaced entities so that every entity comes after the entities
//! it depends on, or reports every dependency cycle that makes this
//! impossible.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums for ordering results; `anyhow::Result`
//!   for config and manifest I/O.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod model;
pub mod plan;
pub mod sort;

pub use error::{CycleError, ErrorCode, SortError, UnresolvedReference};
pub use model::{DependencyRef, Dependent, ObjectRef, Resource};
pub use sort::{DependencyGraph, SortOptions, SortedOrder, sort, sort_with};
