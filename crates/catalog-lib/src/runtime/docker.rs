//! Docker CLI wrapper with per-call timeouts and lenient output parsing

use super::ContainerRuntime;
use crate::models::{ContainerStats, RawContainer, RawInspect};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Install locations checked before falling back to `which`
const WELL_KNOWN_PATHS: &[&str] = &[
    "/usr/local/bin/docker",
    "/opt/homebrew/bin/docker",
    "/usr/bin/docker",
];

const LIST_TIMEOUT: Duration = Duration::from_secs(5);
const INSPECT_TIMEOUT: Duration = Duration::from_secs(10);
const STATS_TIMEOUT: Duration = Duration::from_secs(5);
const WHICH_TIMEOUT: Duration = Duration::from_secs(2);

/// Failure modes of a single runtime invocation
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("container runtime binary not found; install Docker or OrbStack")]
    BinaryNotFound,
    #[error("`docker {command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },
    #[error("`docker {command}` exited with status {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("failed to run container runtime binary")]
    Spawn(#[from] std::io::Error),
}

/// Thin wrapper around the `docker` executable
///
/// Absence of the binary is a value, not an error, so the front-end can
/// render a "runtime not installed" message before issuing any query.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: Option<PathBuf>,
}

impl DockerCli {
    /// Probes well-known install locations, then `which docker`
    pub async fn discover() -> Self {
        for path in WELL_KNOWN_PATHS {
            if Path::new(path).exists() {
                debug!(path, "Found container runtime binary");
                return Self {
                    binary: Some(PathBuf::from(path)),
                };
            }
        }

        match resolve_via_which().await {
            Some(path) => {
                debug!(path = %path.display(), "Resolved container runtime via which");
                Self { binary: Some(path) }
            }
            None => {
                warn!("No container runtime binary found");
                Self { binary: None }
            }
        }
    }

    /// Uses a known binary path; for tests and unusual installs
    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(path.into()),
        }
    }

    /// A client that fails every invocation with `BinaryNotFound`
    pub fn unavailable() -> Self {
        Self { binary: None }
    }

    pub fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    /// Runs one subcommand and captures its stdout.
    ///
    /// This is the shared primitive for the read-only queries and for the
    /// mutating picker actions (start, stop, restart, exec probes).
    pub async fn run(&self, args: &[&str], timeout: Duration) -> Result<String, RuntimeError> {
        let binary = self.binary.as_ref().ok_or(RuntimeError::BinaryNotFound)?;
        let command = args.first().copied().unwrap_or_default().to_string();

        debug!(%command, args = args.len(), "Running container runtime command");

        let output = tokio::time::timeout(
            timeout,
            Command::new(binary).args(args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| RuntimeError::Timeout {
            command: command.clone(),
            timeout_secs: timeout.as_secs(),
        })??;

        if !output.status.success() {
            return Err(RuntimeError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn list_containers(&self) -> Vec<RawContainer> {
        let stdout = match self
            .run(&["ps", "--all", "--format", "{{json .}}"], LIST_TIMEOUT)
            .await
        {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!(error = %e, "Container listing failed");
                return Vec::new();
            }
        };

        parse_container_lines(&stdout)
    }

    async fn inspect_containers(&self, ids: &[String]) -> HashMap<String, RawInspect> {
        if ids.is_empty() {
            return HashMap::new();
        }

        let mut args = vec!["inspect", "--format", "{{json .}}"];
        args.extend(ids.iter().map(String::as_str));

        let stdout = match self.run(&args, INSPECT_TIMEOUT).await {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!(error = %e, "Container inspect failed");
                return HashMap::new();
            }
        };

        parse_inspect_lines(&stdout)
    }

    async fn sample_stats(&self, ids: &[String]) -> HashMap<String, ContainerStats> {
        if ids.is_empty() {
            return HashMap::new();
        }

        let mut args = vec![
            "stats",
            "--no-stream",
            "--format",
            "{{.Container}} {{.CPUPerc}} {{.MemUsage}}",
        ];
        args.extend(ids.iter().map(String::as_str));

        let stdout = match self.run(&args, STATS_TIMEOUT).await {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!(error = %e, "Stats sampling failed");
                return HashMap::new();
            }
        };

        parse_stats_lines(&stdout)
    }
}

async fn resolve_via_which() -> Option<PathBuf> {
    let output = tokio::time::timeout(
        WHICH_TIMEOUT,
        Command::new("which")
            .arg("docker")
            .kill_on_drop(true)
            .output(),
    )
    .await
    .ok()?
    .ok()?;

    if !output.status.success() {
        return None;
    }

    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// One JSON object per line; malformed lines are skipped, not fatal
fn parse_container_lines(stdout: &str) -> Vec<RawContainer> {
    let mut containers = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawContainer>(line) {
            Ok(container) => containers.push(container),
            Err(e) => debug!(error = %e, "Skipping malformed container line"),
        }
    }
    containers
}

fn parse_inspect_lines(stdout: &str) -> HashMap<String, RawInspect> {
    let mut inspected = HashMap::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawInspect>(line) {
            Ok(record) if !record.id.is_empty() => {
                inspected.insert(record.id.clone(), record);
            }
            Ok(_) => debug!("Skipping inspect record without an id"),
            Err(e) => debug!(error = %e, "Skipping malformed inspect line"),
        }
    }
    inspected
}

/// "id cpu% mem" with the memory column free to contain spaces
fn parse_stats_lines(stdout: &str) -> HashMap<String, ContainerStats> {
    let mut stats = HashMap::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, ' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(id), Some(cpu), Some(memory)) if !id.is_empty() => {
                stats.insert(
                    id.to_string(),
                    ContainerStats {
                        cpu_percent: cpu.to_string(),
                        memory_usage: memory.to_string(),
                    },
                );
            }
            _ => debug!("Skipping malformed stats line"),
        }
    }
    stats
}
