mod catalog;
mod dice;
mod domain;
mod error;
mod export;
mod generator;
mod ladder;
mod server;
mod service;
mod store;
mod volume;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::catalog::available_templates;
use crate::server::AppState;
use crate::service::ProgramService;
use crate::store::ProgramStore;

/// Battleship strength-program generator and program API.
#[derive(Parser, Debug)]
#[command(name = "battleship")]
#[command(about = "Dice-driven eight-week strength program generator with a REST API")]
#[command(version)]
struct Args {
    /// SQLite connection string.
    /// Can also be set via BATTLESHIP_DATABASE_URL environment variable.
    #[arg(
        long,
        env = "BATTLESHIP_DATABASE_URL",
        default_value = "sqlite://battleship.db?mode=rwc"
    )]
    database_url: String,

    /// Port number for the web server.
    /// Can also be set via BATTLESHIP_PORT environment variable.
    #[arg(long, value_name = "PORT", env = "BATTLESHIP_PORT", default_value = "8000")]
    port: u16,

    /// Allowed CORS origin; repeat or comma-separate for several.
    #[arg(
        long = "cors-origin",
        env = "BATTLESHIP_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000,http://localhost:5173,http://localhost:5174"
    )]
    cors_origins: Vec<String>,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "BATTLESHIP_MAX_CONNECTIONS", default_value = "5")]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let store = ProgramStore::connect(&args.database_url, args.max_connections)
        .await
        .with_context(|| format!("Failed to open database at {}", args.database_url))?;
    log::info!("Database ready at {}", args.database_url);

    println!("Templates:");
    for template in available_templates() {
        println!(
            "  {:16} {} lifts, {} sessions/week",
            template.key, template.num_lifts, template.sessions_per_week
        );
    }
    println!("CORS origins: {}", args.cors_origins.join(", "));
    println!();

    let state = Arc::new(AppState {
        programs: ProgramService::new(store),
    });

    server::run_server(state, args.port, &args.cors_origins).await?;

    Ok(())
}
