//! orbpick - container picker for orb.local domains
//!
//! `list` renders launcher-ready items for the current container catalog;
//! `act` executes the action payload attached to the selected item.

mod actions;
mod items;
mod notify;
mod output;

use std::sync::Arc;

use anyhow::Result;
use catalog_lib::{ContainerCatalog, DockerCli, FileCache, Settings};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use actions::ActionDispatcher;
use notify::MacNotifier;
use output::OutputFormat;

/// Container picker for orb.local domains
#[derive(Parser)]
#[command(name = "orbpick")]
#[command(author, version, about = "Container catalog and picker for orb.local domains", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List containers as launcher items
    List {
        /// Filter query; matches display name, name, project, service, and image
        query: Option<String>,

        /// Bypass the snapshot cache and ask the runtime directly
        #[arg(long)]
        no_cache: bool,

        /// Output format
        #[arg(long, short, default_value = "items")]
        format: OutputFormat,
    },

    /// Execute an action payload produced by `list`
    Act {
        /// JSON payload carried by the selected item
        payload: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the launcher protocol; diagnostics go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::load()?;
    let runtime = DockerCli::discover().await;
    let cache = FileCache::in_user_cache_dir(settings.cache_ttl_ms);
    let catalog = ContainerCatalog::new(Arc::new(runtime.clone()), cache, settings.clone());

    match cli.command {
        Commands::List {
            query,
            no_cache,
            format,
        } => {
            run_list(&catalog, &runtime, query.as_deref(), no_cache, format).await?;
        }
        Commands::Act { payload } => {
            let dispatcher =
                ActionDispatcher::new(runtime, catalog, settings, Arc::new(MacNotifier));
            dispatcher.run(&payload).await?;
        }
    }

    Ok(())
}

async fn run_list(
    catalog: &ContainerCatalog,
    runtime: &DockerCli,
    query: Option<&str>,
    no_cache: bool,
    format: OutputFormat,
) -> Result<()> {
    let query = items::normalize_query(query);
    let available = runtime.is_available();
    let containers = if available {
        catalog.refresh(!no_cache).await
    } else {
        Vec::new()
    };

    match format {
        OutputFormat::Items => {
            let list = items::ItemList {
                items: items::assemble(available, &containers, query),
            };
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        OutputFormat::Table => {
            if available {
                output::print_container_table(&containers);
            } else {
                output::print_warning("Docker not found");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&containers)?);
        }
    }

    Ok(())
}
