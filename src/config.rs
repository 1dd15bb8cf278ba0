use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

use crate::karma::KarmaRewards;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Configuration for the karma service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KarmaConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Fixed karma rewards
    pub rewards: RewardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, uses the in-memory store)
    pub postgres_enabled: bool,
    /// Maximum pooled connections
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Mask credentials before they reach the logs
    pub sanitize_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Points awarded for voting on a squad roadmap item
    pub roadmap_vote_points: i64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost:5432/forge".to_string(),
            postgres_enabled: false,
            max_connections: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            sanitize_logs: true,
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            roadmap_vote_points: KarmaRewards::default().roadmap_vote_points,
        }
    }
}

impl RewardConfig {
    /// Convert to KarmaRewards for use by KarmaEngine
    pub fn to_rewards(&self) -> KarmaRewards {
        KarmaRewards {
            roadmap_vote_points: self.roadmap_vote_points,
        }
    }
}

impl KarmaConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from an arbitrary variable source
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        // Database configuration
        if let Some(url) = lookup("FORGE_POSTGRES_URL") {
            config.database.postgres_url = url;
        }

        if let Some(enabled) = lookup("FORGE_POSTGRES_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("Invalid FORGE_POSTGRES_ENABLED value")?;
        }

        if let Some(max) = lookup("FORGE_POSTGRES_MAX_CONNECTIONS") {
            config.database.max_connections = max
                .parse()
                .context("Invalid FORGE_POSTGRES_MAX_CONNECTIONS value")?;
        }

        // Logging configuration
        if let Some(level) = lookup("FORGE_LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }

        if let Some(sanitize) = lookup("FORGE_SANITIZE_LOGS") {
            config.logging.sanitize_logs = sanitize
                .parse()
                .context("Invalid FORGE_SANITIZE_LOGS value")?;
        }

        // Reward configuration
        if let Some(points) = lookup("FORGE_KARMA_ROADMAP_VOTE_POINTS") {
            config.rewards.roadmap_vote_points = points
                .parse()
                .context("Invalid FORGE_KARMA_ROADMAP_VOTE_POINTS value")?;
        }

        if !config.logging.sanitize_logs {
            warn!("Log sanitization disabled - database credentials may be logged");
        }

        Ok(config)
    }

    /// Validate configuration for consistency
    fn validate(&self) -> Result<()> {
        if self.database.postgres_enabled {
            let url = &self.database.postgres_url;
            if url.is_empty() {
                return Err(anyhow::anyhow!("PostgreSQL URL cannot be empty when enabled"));
            }
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "PostgreSQL URL must start with postgres:// or postgresql://: {}",
                    sanitize_for_logging(url)
                ));
            }
        }

        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("Max connections must be non-zero"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log level '{}' (expected one of: {})",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.rewards.roadmap_vote_points <= 0 {
            return Err(anyhow::anyhow!("Roadmap vote reward must be positive"));
        }

        Ok(())
    }
}

/// Mask the password of a connection string for logging
pub fn sanitize_for_logging(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };

    match credentials.split_once(':') {
        Some((user, _password)) => format!("{}://{}:***@{}", scheme, user, host),
        None => url.to_string(),
    }
}
