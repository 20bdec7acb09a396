mod api;
mod args;
mod run_log;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use log::info;
use mesh_core::config::MeshConfig;
use mesh_core::logs::HttpLogSource;
use mesh_core::Simulation;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        MeshConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();
    info!("=== Mesh Simulator Starting ===");

    // 1. Core state
    let simulation = Simulation::new(&config);

    // 2. Log collaborator client (usually this very server)
    let log_source = Arc::new(HttpLogSource::new(config.log_source_url.clone()));
    info!("Fetching node logs from {}", config.log_source_url);

    // 3. Serve
    api::run_api_server(simulation, log_source, config).await
}
