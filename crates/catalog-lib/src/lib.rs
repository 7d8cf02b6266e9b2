//! Core library for the orbpick container picker
//!
//! This crate provides the enrichment engine behind the launcher front-end:
//! - Runtime access through the Docker-compatible CLI
//! - Web-service classification and orb.local URL derivation
//! - Per-container enrichment and picker ordering
//! - A time-boxed snapshot cache
//! - Subtitle formatting for picker rows

pub mod cache;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod enrich;
pub mod format;
pub mod models;
pub mod runtime;

pub use cache::{CacheError, CacheLookup, CacheMiss, FileCache};
pub use catalog::{ContainerCatalog, CONTAINERS_CACHE_KEY};
pub use config::Settings;
pub use format::format_subtitle;
pub use models::*;
pub use runtime::{ContainerRuntime, DockerCli, RuntimeError};
