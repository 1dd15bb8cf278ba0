use anyhow::Result;
use tracing::{info, warn, Level};

use forge_karma::{
    config::{sanitize_for_logging, KarmaConfig},
    DatabasePool, KarmaEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = KarmaConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check FORGE_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting Forge karma schema bootstrap");

    let engine = KarmaEngine::new(config.rewards.to_rewards());
    info!(
        roadmap_vote_points = engine.rewards().roadmap_vote_points,
        "Karma engine configured"
    );

    if !config.database.postgres_enabled {
        warn!("PostgreSQL disabled - karma is kept in the in-memory store, nothing to bootstrap");
        return Ok(());
    }

    let url = &config.database.postgres_url;
    if config.logging.sanitize_logs {
        info!("Connecting to {}", sanitize_for_logging(url));
    } else {
        info!("Connecting to {}", url);
    }

    let db = DatabasePool::new(url, config.database.max_connections).await?;
    db.init_schema().await?;

    info!("Karma schema ready");
    Ok(())
}

fn init_logging(config: &KarmaConfig) -> Result<()> {
    let log_level = match config.logging.level.as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
