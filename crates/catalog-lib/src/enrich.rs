//! Per-container enrichment: compose identity, display name, status, URL

use crate::classify;
use crate::models::{
    ComposeLabels, ContainerStats, ContainerStatus, EnrichedContainer, HealthState, RawContainer,
    RawInspect,
};

const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";

/// Extracts the compose identity from an inspect record.
///
/// This is the only place raw label maps are read; empty label values count
/// as absent.
pub fn compose_labels(inspect: Option<&RawInspect>) -> ComposeLabels {
    let Some(labels) = inspect.and_then(|i| i.config.labels.as_ref()) else {
        return ComposeLabels::default();
    };

    let non_empty = |key: &str| labels.get(key).filter(|value| !value.is_empty()).cloned();
    ComposeLabels {
        project: non_empty(COMPOSE_PROJECT_LABEL),
        service: non_empty(COMPOSE_SERVICE_LABEL),
    }
}

/// Builds the display-ready view of one container from its raw records.
///
/// Inspect data and stats are optional; every derived field degrades to a
/// sensible default rather than failing.
pub fn enrich(
    scheme: &str,
    container: &RawContainer,
    inspect: Option<&RawInspect>,
    stats: Option<&ContainerStats>,
) -> EnrichedContainer {
    let labels = compose_labels(inspect);
    let status = ContainerStatus::from_status_text(&container.status);
    let health = inspect
        .and_then(|i| i.state.health.as_ref())
        .map(|report| HealthState::from_report(&report.status))
        .unwrap_or(HealthState::Unknown);

    let url = classify::derive_url(scheme, container, &labels);
    let is_web = classify::is_web_service(container, inspect, &labels);
    let display_name = display_name(container, &labels, is_web);

    EnrichedContainer {
        id: container.id.clone(),
        name: container.clean_name().to_string(),
        display_name,
        project: labels.project.clone(),
        service: labels.service.clone(),
        status,
        health,
        image: container.image.clone(),
        ports: container.ports.clone(),
        url,
        is_web_service: is_web,
        stats: stats.cloned(),
    }
}

/// Service name wins over container name, which wins over the short id. Web
/// services additionally fold the cleaned project name in.
fn display_name(container: &RawContainer, labels: &ComposeLabels, is_web: bool) -> String {
    let base = labels.service.clone().unwrap_or_else(|| {
        let name = container.clean_name();
        if name.is_empty() {
            container.short_id().to_string()
        } else {
            name.to_string()
        }
    });

    if !is_web {
        return base;
    }

    let project_display = labels
        .project
        .as_deref()
        .map(classify::clean_project_name)
        .unwrap_or_default();

    match (&labels.service, project_display.is_empty()) {
        (Some(service), false) => format!("{service} - {project_display}"),
        (None, false) => project_display,
        (Some(service), true) => service.clone(),
        (None, true) => base,
    }
}
