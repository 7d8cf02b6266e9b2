//! Subtitle formatting for picker rows

use crate::models::{EnrichedContainer, HealthState};

/// Joins the present pieces of a container's story with " • ": project,
/// status (with health when known), URL for web services, CPU usage, and the
/// first port mapping. Absent pieces are omitted entirely.
pub fn format_subtitle(container: &EnrichedContainer) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(project) = &container.project {
        parts.push(project.clone());
    }

    let mut status = container.status.to_string();
    if container.health != HealthState::Unknown {
        status = format!("{status} • {}", container.health);
    }
    parts.push(status);

    if container.is_web_service {
        parts.push(format!("🌐 {}", container.url.trim_end_matches('/')));
    }

    if let Some(stats) = &container.stats {
        if !stats.cpu_percent.is_empty() {
            parts.push(format!("{} CPU", stats.cpu_percent));
        }
    }

    if container.ports.contains("->") {
        if let Some(first) = container.ports.split(',').next() {
            parts.push(format!("ports: {}", first.trim()));
        }
    }

    parts.join(" • ")
}
