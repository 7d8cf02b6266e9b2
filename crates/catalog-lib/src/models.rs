//! Core data models for the container catalog

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One entry of `docker ps --all --format '{{json .}}'`
///
/// Every field is defaulted so a partial record still parses; the catalog
/// decides later what to do with blank identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawContainer {
    #[serde(rename = "ID", default)]
    pub id: String,
    /// Name as reported by the runtime, possibly with a leading slash
    #[serde(rename = "Names", default)]
    pub names: String,
    /// Free-form status text, e.g. "Up 3 hours (healthy)" or "Exited (0) 2 days ago"
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Image", default)]
    pub image: String,
    /// Port mapping summary, e.g. "0.0.0.0:8080->80/tcp, :::8080->80/tcp"
    #[serde(rename = "Ports", default)]
    pub ports: String,
}

impl RawContainer {
    /// Name without the runtime's leading slashes
    pub fn clean_name(&self) -> &str {
        self.names.trim_start_matches('/')
    }

    /// First 12 characters of the identifier, or all of it when shorter
    pub fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }
}

/// One entry of `docker inspect --format '{{json .}}'`
///
/// Only the slices of the inspect document the enrichment pipeline reads are
/// modelled; everything else is ignored during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInspect {
    /// Full 64-character container identifier
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "Config", default)]
    pub config: InspectConfig,
    #[serde(rename = "State", default)]
    pub state: InspectState,
    #[serde(rename = "NetworkSettings", default)]
    pub network_settings: NetworkSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectConfig {
    /// The runtime reports `null` labels for label-less containers
    #[serde(rename = "Labels", default)]
    pub labels: Option<HashMap<String, String>>,
    /// Keys are "port/proto" specs; the values carry nothing useful
    #[serde(rename = "ExposedPorts", default)]
    pub exposed_ports: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectState {
    #[serde(rename = "Health", default)]
    pub health: Option<HealthReport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(rename = "Status", default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Keys are "port/proto" specs; values are null or host binding arrays
    #[serde(rename = "Ports", default)]
    pub ports: Option<HashMap<String, serde_json::Value>>,
}

/// Coarse lifecycle state derived from the runtime's free-form status text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Running,
    Stopped,
    Unknown,
}

impl ContainerStatus {
    /// Case-insensitive substring mapping: "up" wins over "exited", anything
    /// else is unknown
    pub fn from_status_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("up") {
            ContainerStatus::Running
        } else if lower.contains("exited") {
            ContainerStatus::Stopped
        } else {
            ContainerStatus::Unknown
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ContainerStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Running => "running",
            ContainerStatus::Stopped => "stopped",
            ContainerStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health-check verdict from the inspect record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
    Starting,
    /// No health check configured, or an unrecognised report
    Unknown,
}

impl HealthState {
    pub fn from_report(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "healthy" => HealthState::Healthy,
            "unhealthy" => HealthState::Unhealthy,
            "starting" => HealthState::Starting,
            _ => HealthState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
            HealthState::Starting => "starting",
            HealthState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compose project/service identity extracted from runtime labels
///
/// Each half is present only when the corresponding label exists and is
/// non-empty. The rest of the pipeline works with this type instead of raw
/// label maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeLabels {
    pub project: Option<String>,
    pub service: Option<String>,
}

impl ComposeLabels {
    /// Both halves, when the container carries a complete compose identity
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (&self.project, &self.service) {
            (Some(project), Some(service)) => Some((project, service)),
            _ => None,
        }
    }
}

/// Point-in-time resource usage strings as the runtime reports them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStats {
    /// e.g. "0.52%"
    pub cpu_percent: String,
    /// e.g. "12.3MiB / 7.66GiB"
    pub memory_usage: String,
}

/// A fully enriched catalog entry, ready for picker display
///
/// Snapshots compare by value and round-trip through the cache unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedContainer {
    pub id: String,
    /// Runtime name with any leading slash stripped
    pub name: String,
    /// Never empty; falls back to the first 12 characters of the id
    pub display_name: String,
    pub project: Option<String>,
    pub service: Option<String>,
    pub status: ContainerStatus,
    pub health: HealthState,
    pub image: String,
    pub ports: String,
    /// Derived `*.orb.local` URL, always present and well-formed
    pub url: String,
    pub is_web_service: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stats: Option<ContainerStats>,
}
