//! Dispatcher for the action payloads attached to launcher items
//!
//! Runtime failures are reported through the notifier rather than the exit
//! code; the process fails only when the payload itself cannot be parsed.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_lib::{ContainerCatalog, DockerCli, EnrichedContainer, RuntimeError, Settings};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::warn;

use crate::items::{ActionKind, ActionPayload, ProjectAction};
use crate::notify::{applescript_escape, Notifier};

/// start/stop/restart can sit behind the runtime's stop grace period
const MUTATE_TIMEOUT: Duration = Duration::from_secs(30);
/// Quick state checks and in-container shell probes
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// open, pbcopy, and osascript helpers
const HELPER_TIMEOUT: Duration = Duration::from_secs(10);

/// Shells probed inside the container, most comfortable first
const SHELL_CANDIDATES: &[&str] = &["/bin/bash", "/bin/sh", "/bin/zsh"];

pub struct ActionDispatcher {
    runtime: DockerCli,
    catalog: ContainerCatalog,
    settings: Settings,
    notifier: Arc<dyn Notifier>,
}

impl ActionDispatcher {
    pub fn new(
        runtime: DockerCli,
        catalog: ContainerCatalog,
        settings: Settings,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            runtime,
            catalog,
            settings,
            notifier,
        }
    }

    /// Parses and executes one payload. `Err` means the payload itself was
    /// unusable; everything that goes wrong afterwards is reported through
    /// the notifier instead.
    pub async fn run(&self, payload_json: &str) -> Result<()> {
        let payload: ActionPayload =
            serde_json::from_str(payload_json).context("invalid action payload")?;
        self.dispatch(&payload).await;
        Ok(())
    }

    pub async fn dispatch(&self, payload: &ActionPayload) {
        match effective_action(payload) {
            ActionKind::OpenUrl => self.open_url(&payload.url).await,
            ActionKind::Start => self.mutate("start", "Started", payload).await,
            ActionKind::Stop => self.mutate("stop", "Stopped", payload).await,
            ActionKind::Restart => self.mutate("restart", "Restarted", payload).await,
            ActionKind::Logs => self.open_logs(payload).await,
            ActionKind::CopyUrl => self.copy_url(&payload.url).await,
            ActionKind::ProjectAction => self.project_action(payload).await,
            ActionKind::Default | ActionKind::Shell => self.open_shell(payload).await,
        }
    }

    async fn open_url(&self, url: &str) {
        if url.is_empty() {
            self.notifier.error("No URL provided").await;
            return;
        }

        match run_helper("open", &[url]).await {
            Ok(()) => self.notifier.notify(&format!("Opened {url}")).await,
            Err(e) => {
                warn!(error = %e, url, "Failed to open URL");
                self.notifier.error(&format!("Failed to open {url}")).await;
            }
        }
    }

    /// One start/stop/restart of a single container
    async fn mutate(&self, verb: &str, past: &str, payload: &ActionPayload) {
        if payload.id.is_empty() {
            self.notifier.error("No container ID provided").await;
            return;
        }

        match self
            .runtime
            .run(&[verb, payload.id.as_str()], MUTATE_TIMEOUT)
            .await
        {
            Ok(_) => {
                self.catalog.invalidate();
                self.notifier
                    .notify(&format!("{past} container {}", short_id(&payload.id)))
                    .await;
            }
            Err(e) => {
                warn!(error = %e, verb, container_id = %payload.id, "Container mutation failed");
                self.notifier
                    .error(&format!("Failed to {verb} container: {}", failure_detail(&e)))
                    .await;
            }
        }
    }

    async fn open_logs(&self, payload: &ActionPayload) {
        if payload.id.is_empty() {
            self.notifier.error("No container ID provided").await;
            return;
        }
        let Some(binary) = self.runtime.binary() else {
            self.notifier.error("Docker not found").await;
            return;
        };

        let command = format!(
            "\"{}\" logs --since={} --tail=200 -f {}",
            binary.display(),
            self.settings.logs_since,
            payload.id
        );
        self.open_terminal(&command, &format!("Logs: {}", display_label(payload)))
            .await;
    }

    async fn open_shell(&self, payload: &ActionPayload) {
        if payload.id.is_empty() {
            self.notifier.error("No container ID provided").await;
            return;
        }
        let Some(binary) = self.runtime.binary() else {
            self.notifier.error("Docker not found").await;
            return;
        };

        // exec -it needs a live container
        let running = self
            .runtime
            .run(
                &["inspect", "-f", "{{.State.Running}}", payload.id.as_str()],
                PROBE_TIMEOUT,
            )
            .await
            .map(|out| out.trim() == "true")
            .unwrap_or(false);
        if !running {
            self.notifier.error("Container is not running").await;
            return;
        }

        for shell in self.shell_candidates() {
            let probe = self
                .runtime
                .run(
                    &["exec", payload.id.as_str(), "test", "-f", shell.as_str()],
                    PROBE_TIMEOUT,
                )
                .await;
            if probe.is_ok() {
                let command = format!(
                    "\"{}\" exec -it {} {}",
                    binary.display(),
                    payload.id,
                    shell
                );
                self.open_terminal(&command, &format!("Shell: {}", display_label(payload)))
                    .await;
                return;
            }
        }

        self.notifier
            .error("No suitable shell found in container")
            .await;
    }

    /// The built-in candidates, with the configured fallback appended when
    /// it is not already one of them
    fn shell_candidates(&self) -> Vec<String> {
        let mut candidates: Vec<String> =
            SHELL_CANDIDATES.iter().map(|s| s.to_string()).collect();

        let fallback = self.settings.fallback_shell.trim();
        if !fallback.is_empty() && !candidates.iter().any(|c| c == fallback) {
            candidates.push(fallback.to_string());
        }
        candidates
    }

    async fn copy_url(&self, url: &str) {
        if url.is_empty() {
            self.notifier.error("No URL provided").await;
            return;
        }

        match pipe_to_pbcopy(url).await {
            Ok(()) => self.notifier.notify(&format!("Copied {url}")).await,
            Err(e) => {
                warn!(error = %e, "Clipboard copy failed");
                self.notifier.error("Failed to copy URL").await;
            }
        }
    }

    async fn project_action(&self, payload: &ActionPayload) {
        let Some(project) = payload.project.as_deref().filter(|p| !p.is_empty()) else {
            self.notifier.error("No project specified").await;
            return;
        };

        let members = self.catalog.project_containers(project).await;
        if members.is_empty() {
            self.notifier
                .error(&format!("No containers found for project {project}"))
                .await;
            return;
        }

        let description = format!("project {project}");
        match payload.project_action {
            Some(ProjectAction::StartProject) => {
                let stopped: Vec<&EnrichedContainer> =
                    members.iter().filter(|c| !c.status.is_running()).collect();
                if stopped.is_empty() {
                    self.notifier
                        .notify(&format!("All containers in {project} are already running"))
                        .await;
                } else {
                    self.batch("start", "Started", &stopped, &description).await;
                }
            }
            Some(ProjectAction::StopProject) => {
                let running: Vec<&EnrichedContainer> =
                    members.iter().filter(|c| c.status.is_running()).collect();
                if running.is_empty() {
                    self.notifier
                        .notify(&format!("All containers in {project} are already stopped"))
                        .await;
                } else {
                    self.batch("stop", "Stopped", &running, &description).await;
                }
            }
            None => self.notifier.error("No project action specified").await,
        }
    }

    /// Applies one verb to every container, then reports the tally
    async fn batch(
        &self,
        verb: &str,
        past: &str,
        containers: &[&EnrichedContainer],
        description: &str,
    ) {
        let mut succeeded = 0usize;
        for container in containers {
            match self
                .runtime
                .run(&[verb, container.id.as_str()], MUTATE_TIMEOUT)
                .await
            {
                Ok(_) => succeeded += 1,
                Err(e) => {
                    warn!(error = %e, container_id = %container.id, "Batch mutation failed")
                }
            }
        }

        self.catalog.invalidate();

        if succeeded == containers.len() {
            self.notifier
                .notify(&format!(
                    "Successfully {} {succeeded} containers in {description}",
                    past.to_lowercase()
                ))
                .await;
        } else if succeeded > 0 {
            self.notifier
                .notify(&format!(
                    "{past} {succeeded}/{} containers in {description}",
                    containers.len()
                ))
                .await;
        } else {
            self.notifier
                .error(&format!("Failed to {verb} containers in {description}"))
                .await;
        }
    }

    async fn open_terminal(&self, command: &str, title: &str) {
        let script = format!(
            "tell application \"Terminal\"\n\
             \tactivate\n\
             \tdo script \"{}\"\n\
             \tset custom title of front window to \"{}\"\n\
             end tell",
            applescript_escape(command),
            applescript_escape(title)
        );

        if let Err(e) = run_helper("osascript", &["-e", &script]).await {
            warn!(error = %e, "Failed to open Terminal window");
            self.notifier.error("Failed to open terminal").await;
        }
    }
}

/// `default` resolves to the payload's precomputed action; everything else
/// stands for itself. The fallback is a shell, matching the non-web default.
fn effective_action(payload: &ActionPayload) -> ActionKind {
    match payload.action {
        ActionKind::Default => match payload.default_action.unwrap_or(ActionKind::Shell) {
            ActionKind::Default => ActionKind::Shell,
            resolved => resolved,
        },
        action => action,
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

/// Container name when the payload has one, short id otherwise
fn display_label(payload: &ActionPayload) -> &str {
    if payload.name.is_empty() {
        short_id(&payload.id)
    } else {
        &payload.name
    }
}

/// Prefer the runtime's own stderr over the error wrapper when present
fn failure_detail(error: &RuntimeError) -> String {
    match error {
        RuntimeError::CommandFailed { stderr, .. } if !stderr.is_empty() => stderr.clone(),
        other => other.to_string(),
    }
}

/// Spawns a helper program and treats any non-zero exit as failure
async fn run_helper(program: &str, args: &[&str]) -> Result<()> {
    let output = tokio::time::timeout(
        HELPER_TIMEOUT,
        Command::new(program).args(args).kill_on_drop(true).output(),
    )
    .await
    .with_context(|| format!("{program} timed out"))?
    .with_context(|| format!("failed to run {program}"))?;

    if output.status.success() {
        Ok(())
    } else {
        anyhow::bail!(
            "{program} exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        )
    }
}

async fn pipe_to_pbcopy(text: &str) -> Result<()> {
    let mut child = Command::new("pbcopy")
        .stdin(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .context("failed to run pbcopy")?;

    let mut stdin = child.stdin.take().context("pbcopy stdin unavailable")?;
    stdin
        .write_all(text.as_bytes())
        .await
        .context("failed to write to pbcopy")?;
    drop(stdin);

    let status = tokio::time::timeout(HELPER_TIMEOUT, child.wait())
        .await
        .context("pbcopy timed out")?
        .context("pbcopy did not exit")?;

    if status.success() {
        Ok(())
    } else {
        anyhow::bail!("pbcopy exited with {:?}", status.code())
    }
}
