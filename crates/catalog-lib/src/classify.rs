//! Web-service classification and orb.local URL derivation
//!
//! Pure functions over raw runtime records. Classification is a short-circuit
//! chain of three heuristics: published/exposed ports, name and label hints
//! (with a per-candidate negative veto), and image keywords.

use crate::models::{ComposeLabels, RawContainer, RawInspect};
use std::collections::BTreeSet;

/// Ports that almost always mean "something is serving HTTP here"
const COMMON_WEB_PORTS: &[u16] = &[
    80, 443, 3000, 3001, 4000, 5000, 5001, 7000, 7001, 8000, 8001, 8080, 8081, 8888, 4200, 5173,
];

/// Names that suggest a container is not a website even when other hints match
const NEGATIVE_SERVICE_KEYWORDS: &[&str] = &[
    "db", "database", "postgres", "mysql", "mariadb", "mongo", "redis", "cache", "worker", "queue",
    "scheduler", "job", "task", "celery", "rabbit", "message", "broker", "minio", "s3",
];

/// Positive hints that usually point at a user-facing web service
const POSITIVE_SERVICE_KEYWORDS: &[&str] = &["web", "frontend", "ui", "client", "site"];

/// Images that are typically web servers or frameworks serving HTTP
const WEB_IMAGE_KEYWORDS: &[&str] = &[
    "nginx", "httpd", "caddy", "traefik", "haproxy", "node", "python", "gunicorn", "uwsgi",
    "apache", "php", "rails", "django", "flask", "nextjs", "nuxt", "vite", "express",
];

/// Derives the predictable `*.orb.local` URL for a container.
///
/// A complete compose identity yields `{scheme}://{service}.{project}.orb.local/`;
/// otherwise the cleaned container name (or the short id when the name is
/// blank) becomes the hostname. The result always carries a trailing slash.
pub fn derive_url(scheme: &str, container: &RawContainer, labels: &ComposeLabels) -> String {
    let domain = if let Some((project, service)) = labels.pair() {
        format!("{service}.{project}.orb.local")
    } else {
        let name = container.clean_name();
        let host = if name.is_empty() {
            container.short_id()
        } else {
            name
        };
        format!("{host}.orb.local")
    };
    format!("{scheme}://{domain}/")
}

/// Decides whether a container is likely a user-facing web service.
pub fn is_web_service(
    container: &RawContainer,
    inspect: Option<&RawInspect>,
    labels: &ComposeLabels,
) -> bool {
    let ports = container_ports(container, inspect);
    if ports.iter().any(|port| COMMON_WEB_PORTS.contains(port)) {
        return true;
    }

    if has_positive_name_hint(container, labels) {
        return true;
    }

    image_suggests_web(&container.image)
}

/// Returns a human-friendly project name: separators become spaces, a leading
/// numeric ordering prefix is dropped, whitespace is collapsed.
pub fn clean_project_name(project: &str) -> String {
    let spaced: String = project
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let without_prefix = spaced.trim_start_matches(|c: char| c.is_ascii_digit());
    without_prefix.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collects container-side port numbers from the listing's mapping string and
/// the inspect record's exposed/bound port keys.
///
/// For arrow mappings only the container side (after the last `->`) counts;
/// the host side is deliberately ignored.
pub(crate) fn container_ports(
    container: &RawContainer,
    inspect: Option<&RawInspect>,
) -> BTreeSet<u16> {
    let mut ports = BTreeSet::new();

    for mapping in container.ports.split(',') {
        let mapping = mapping.trim();
        if mapping.is_empty() {
            continue;
        }
        match mapping.rsplit_once("->") {
            Some((_, target)) => add_port(&mut ports, target),
            None => add_port(&mut ports, mapping),
        }
    }

    if let Some(inspect) = inspect {
        if let Some(exposed) = &inspect.config.exposed_ports {
            for key in exposed.keys() {
                add_port(&mut ports, key);
            }
        }
        if let Some(bound) = &inspect.network_settings.ports {
            for key in bound.keys() {
                add_port(&mut ports, key);
            }
        }
    }

    ports
}

/// Parses "8080", "80/tcp" and friends; anything non-numeric is dropped.
fn add_port(ports: &mut BTreeSet<u16>, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return;
    }
    let port_part = trimmed.split('/').next().unwrap_or(trimmed);
    if !port_part.is_empty() && port_part.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(port) = port_part.parse::<u16>() {
            ports.insert(port);
        }
    }
}

/// Checks name, service, and project hints in that order. A candidate that
/// contains any negative keyword is vetoed on its own; the remaining
/// candidates can still match a positive keyword.
fn has_positive_name_hint(container: &RawContainer, labels: &ComposeLabels) -> bool {
    let mut candidates = Vec::new();

    let name = container.clean_name();
    if !name.is_empty() {
        candidates.push(name.to_lowercase());
    }
    if let Some(service) = &labels.service {
        candidates.push(service.to_lowercase());
    }
    if let Some(project) = &labels.project {
        candidates.push(project.to_lowercase());
    }

    candidates.iter().any(|candidate| {
        !NEGATIVE_SERVICE_KEYWORDS
            .iter()
            .any(|neg| candidate.contains(neg))
            && POSITIVE_SERVICE_KEYWORDS
                .iter()
                .any(|pos| candidate.contains(pos))
    })
}

fn image_suggests_web(image: &str) -> bool {
    let image_lower = image.to_lowercase();
    WEB_IMAGE_KEYWORDS
        .iter()
        .any(|keyword| image_lower.contains(keyword))
}
