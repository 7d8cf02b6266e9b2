//! Terminal rendering for human-driven invocations

use catalog_lib::{ContainerStatus, EnrichedContainer, HealthState};
use clap::ValueEnum;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for the `list` subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Launcher script-filter JSON (default)
    #[default]
    Items,
    /// Human-readable table
    Table,
    /// Raw enriched records as JSON
    Json,
}

/// Row for the container table
#[derive(Tabled)]
struct ContainerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "CPU")]
    cpu: String,
}

/// Print the enriched catalog as a table
pub fn print_container_table(containers: &[EnrichedContainer]) {
    if containers.is_empty() {
        print_warning("No containers found");
        return;
    }

    let rows: Vec<ContainerRow> = containers.iter().map(container_row).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!("\nTotal: {} containers", containers.len());
}

fn container_row(container: &EnrichedContainer) -> ContainerRow {
    ContainerRow {
        id: truncate_id(&container.id),
        name: container.display_name.clone(),
        status: color_status(container.status),
        health: color_health(container.health),
        project: container.project.clone().unwrap_or_default(),
        url: container.url.clone(),
        cpu: container
            .stats
            .as_ref()
            .map(|stats| stats.cpu_percent.clone())
            .unwrap_or_default(),
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Color status based on value
fn color_status(status: ContainerStatus) -> String {
    match status {
        ContainerStatus::Running => status.to_string().green().to_string(),
        ContainerStatus::Stopped => status.to_string().red().to_string(),
        ContainerStatus::Unknown => status.to_string().yellow().to_string(),
    }
}

/// Color health based on value
fn color_health(health: HealthState) -> String {
    match health {
        HealthState::Healthy => health.to_string().green().to_string(),
        HealthState::Unhealthy => health.to_string().red().to_string(),
        HealthState::Starting => health.to_string().yellow().to_string(),
        HealthState::Unknown => health.to_string(),
    }
}

/// Truncate a full container id to its customary short form
fn truncate_id(id: &str) -> String {
    id.get(..12).unwrap_or(id).to_string()
}
