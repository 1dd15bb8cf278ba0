//! Karma Repository - PostgreSQL persistence for the karma ledger
//!
//! Handles schema bootstrap and reads. Writes happen through
//! `KarmaTransaction`, implemented here for an open sqlx transaction so the
//! ledger insert and the aggregate increment share one commit.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::karma::{KarmaLedgerEntry, KarmaReason, KarmaTransaction, UserKarmaState};

pub struct KarmaRepository {
    pool: PgPool,
}

impl KarmaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize karma schema and tables
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing karma schema...");

        sqlx::query("CREATE SCHEMA IF NOT EXISTS karma")
            .execute(&self.pool)
            .await
            .context("Failed to create karma schema")?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS karma.users (
                id VARCHAR(255) PRIMARY KEY,
                karma_score BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(&self.pool)
        .await
        .context("Failed to create users table")?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS karma.ledger (
                id UUID PRIMARY KEY,
                user_id VARCHAR(255) NOT NULL REFERENCES karma.users(id),
                points BIGINT NOT NULL CHECK (points <> 0),
                reason VARCHAR(255) NOT NULL,
                squad_id VARCHAR(255),
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(&self.pool)
        .await
        .context("Failed to create ledger table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_ledger_user ON karma.ledger(user_id, created_at)")
            .execute(&self.pool)
            .await
            .context("Failed to create ledger index")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_karma ON karma.users(karma_score)")
            .execute(&self.pool)
            .await
            .context("Failed to create karma score index")?;

        info!("Karma schema initialized");
        Ok(())
    }

    /// Register a user with a zero karma score if it does not exist yet
    pub async fn ensure_user(&self, user_id: &str) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO karma.users (id) VALUES ($1)
            ON CONFLICT (id) DO NOTHING
        "#)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to ensure user")?;

        Ok(())
    }

    /// Get the cached karma aggregate for a user
    pub async fn get_state(&self, user_id: &str) -> Result<Option<UserKarmaState>> {
        let row = sqlx::query(r#"
            SELECT id, karma_score, updated_at
            FROM karma.users
            WHERE id = $1
        "#)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get karma state")?;

        Ok(row.map(|row| UserKarmaState {
            user_id: row.get("id"),
            karma_score: row.get("karma_score"),
            updated_at: row.get("updated_at"),
        }))
    }

    /// Get a user's most recent ledger entries, newest first
    pub async fn get_ledger(&self, user_id: &str, limit: i64) -> Result<Vec<KarmaLedgerEntry>> {
        let rows = sqlx::query(r#"
            SELECT id, user_id, points, reason, squad_id, created_at
            FROM karma.ledger
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
        "#)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get karma ledger")?;

        let entries: Vec<KarmaLedgerEntry> = rows.iter().map(ledger_entry_from_row).collect();
        debug!(user_id = %user_id, count = entries.len(), "Loaded karma ledger");

        Ok(entries)
    }
}

fn ledger_entry_from_row(row: &PgRow) -> KarmaLedgerEntry {
    let id: Uuid = row.get("id");
    let reason: String = row.get("reason");
    let created_at: DateTime<Utc> = row.get("created_at");

    KarmaLedgerEntry {
        id,
        user_id: row.get("user_id"),
        points: row.get("points"),
        reason: KarmaReason::from_tag(&reason),
        squad_id: row.get("squad_id"),
        created_at,
    }
}

#[async_trait]
impl<'c> KarmaTransaction for Transaction<'c, Postgres> {
    async fn insert_ledger_entry(&mut self, entry: &KarmaLedgerEntry) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO karma.ledger (id, user_id, points, reason, squad_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#)
        .bind(entry.id)
        .bind(&entry.user_id)
        .bind(entry.points)
        .bind(entry.reason.as_str())
        .bind(&entry.squad_id)
        .bind(entry.created_at)
        .execute(&mut **self)
        .await?;

        Ok(())
    }

    async fn increment_karma_score(&mut self, user_id: &str, points: i64) -> Result<()> {
        let result = sqlx::query(r#"
            UPDATE karma.users
            SET karma_score = karma_score + $2, updated_at = NOW()
            WHERE id = $1
        "#)
        .bind(user_id)
        .bind(points)
        .execute(&mut **self)
        .await?;

        if result.rows_affected() == 0 {
            bail!("User {} not found", user_id);
        }

        Ok(())
    }
}
