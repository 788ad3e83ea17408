mod agent;
mod api;
mod config;
mod db;
mod error;
mod movement;
mod types;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::agent::SubprocessAgent;
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState, Windows};
use crate::config::Config;
use crate::db::{OddsReader, OddsRecorder};
use crate::error::Result;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", cfg.db_path))?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    if let Some(seed) = &cfg.seed_file {
        let today = chrono::Utc::now().date_naive();
        OddsRecorder::new(pool.clone())
            .seed_from_file(Path::new(seed), today)
            .await?;
    }

    // --- Betting agent ---
    let agent = SubprocessAgent::from_config(&cfg);
    if !Path::new(&cfg.agent_script).exists() {
        info!("Betting agent script {} not found; /betting-agent will return 502", cfg.agent_script);
    }

    // --- HTTP API server ---
    let api_state = ApiState {
        reader: OddsReader::new(pool.clone()),
        windows: Windows::from_config(&cfg),
        health: Arc::new(HealthState::new()),
        latency: Arc::new(LatencyStats::new()),
        agent: Arc::new(agent),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        movement_days = cfg.movement_lookahead_days,
        terminal_back = cfg.terminal_lookback_days,
        terminal_ahead = cfg.terminal_lookahead_days,
        "HTTP API listening on {bind_addr}"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
