//! User-facing feedback for dispatched actions
//!
//! The picker runs without a terminal attached, so feedback goes through a
//! macOS notification banner first, the launcher's large type display
//! second, and stderr as the last resort.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const OSASCRIPT_TIMEOUT: Duration = Duration::from_secs(5);

const NOTIFY_TITLE: &str = "Orbpick";
const ERROR_TITLE: &str = "Orbpick Error";

/// Delivery seam for action feedback; mocked in dispatcher tests
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Confirmation after a successful action
    async fn notify(&self, message: &str);

    /// Failure report shown to the user
    async fn error(&self, message: &str);
}

/// osascript-backed notifier used in production
pub struct MacNotifier;

#[async_trait]
impl Notifier for MacNotifier {
    async fn notify(&self, message: &str) {
        deliver(message, NOTIFY_TITLE, message.to_string()).await;
    }

    async fn error(&self, message: &str) {
        deliver(message, ERROR_TITLE, format!("Error: {message}")).await;
    }
}

/// Banner, then large type, then the given stderr line
async fn deliver(message: &str, title: &str, stderr_line: String) {
    let escaped = applescript_escape(message);

    let banner = format!("display notification \"{escaped}\" with title \"{title}\"");
    if run_osascript(&banner).await {
        return;
    }

    let large_type = format!("tell application \"Alfred\" to show large type \"{escaped}\"");
    if run_osascript(&large_type).await {
        return;
    }

    eprintln!("{stderr_line}");
}

async fn run_osascript(script: &str) -> bool {
    let result = tokio::time::timeout(
        OSASCRIPT_TIMEOUT,
        Command::new("osascript")
            .arg("-e")
            .arg(script)
            .kill_on_drop(true)
            .output(),
    )
    .await;

    match result {
        Ok(Ok(output)) if output.status.success() => true,
        Ok(Ok(output)) => {
            debug!(code = ?output.status.code(), "osascript rejected the script");
            false
        }
        Ok(Err(e)) => {
            debug!(error = %e, "osascript not runnable");
            false
        }
        Err(_) => {
            debug!("osascript timed out");
            false
        }
    }
}

/// Escape a string for embedding in an AppleScript string literal
pub fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
