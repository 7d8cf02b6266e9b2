//! Container runtime access via the Docker-compatible CLI
//!
//! The catalog only ever issues three read-only queries: list, inspect, and
//! stats. All of them degrade to empty results when the runtime is missing or
//! misbehaving; the picker must stay useful no matter what the runtime does.

mod docker;


pub use docker::{DockerCli, RuntimeError};

use crate::models::{ContainerStats, RawContainer, RawInspect};
use std::collections::HashMap;

pub use async_trait::async_trait;

/// Read-only queries the catalog needs from a container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// All containers, running or not
    async fn list_containers(&self) -> Vec<RawContainer>;

    /// Detailed records keyed by full container id
    async fn inspect_containers(&self, ids: &[String]) -> HashMap<String, RawInspect>;

    /// Point-in-time usage keyed by the id the runtime echoes back
    async fn sample_stats(&self, ids: &[String]) -> HashMap<String, ContainerStats>;
}
