//! Database Connection Pool using sqlx

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::database::karma::KarmaRepository;

pub struct DatabasePool {
    pool: PgPool,
    karma: KarmaRepository,
}

impl DatabasePool {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!(max_connections, "Connected to PostgreSQL");

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        let karma = KarmaRepository::new(pool.clone());
        Self { pool, karma }
    }

    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema...");
        self.karma.init_schema().await?;
        info!("Database schema initialized");
        Ok(())
    }

    /// Open a transaction. Karma writes are applied through it with
    /// `apply_karma_delta` and land only when the caller commits.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    pub fn karma(&self) -> &KarmaRepository {
        &self.karma
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
