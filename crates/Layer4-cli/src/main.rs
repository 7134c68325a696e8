//! Berth CLI - Main entry point

mod cli;

use anyhow::Context;
use berth_core::{AppConfig, Application, Runtime, APP_DESCRIPTOR_FILE};
use berth_engine::DockerEngine;
use berth_foundation::BerthConfig;
use berth_proxy::ProxyExtension;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Berth - local development environments on docker compose
#[derive(Parser, Debug)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// App directory (defaults to the current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Print service info as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the app and the shared proxy
    Start,
    /// Stop the app's containers
    Stop,
    /// Stop then start the app
    Restart,
    /// Rebuild containers from the current descriptor, keeping volumes
    Rebuild,
    /// Remove the app's containers and volumes
    Destroy,
    /// Show service info and urls
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let start = match args.path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let descriptor = AppConfig::locate(&start).with_context(|| {
        format!(
            "Could not find a {} in {} or any parent directory",
            APP_DESCRIPTOR_FILE,
            start.display()
        )
    })?;
    let root = descriptor
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| start.clone());

    let config = BerthConfig::load(&root)?;
    tracing::debug!(root = %root.display(), "Loaded config");

    let engine = DockerEngine::new()?;
    let runtime = Runtime::builder(config)
        .with_engine(Arc::new(engine))
        .with_builtin(Arc::new(ProxyExtension::new()))
        .build()?;

    let mut app = Application::load(descriptor, runtime)?;
    cli::execute(&mut app, &args.command, args.json).await
}
