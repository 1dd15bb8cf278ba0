//! Karma Engine - applies karma changes inside a caller-owned transaction
//!
//! Nothing here opens, commits or rolls back a transaction. Every mutating
//! operation takes an already-open scope so karma can be one step of a
//! larger unit of work (e.g. "cast vote" = update vote row + update post
//! score + apply karma).

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::karma::ledger::{KarmaDelta, KarmaLedgerEntry, KarmaReason};
use crate::karma::score::karma_delta_from_scores;

/// Transactional scope the engine writes through.
///
/// Implemented by `sqlx::Transaction<'_, Postgres>` and `MemoryKarmaTx`.
/// Both writes of one karma change go through the same scope, so they
/// commit or roll back together.
#[async_trait]
pub trait KarmaTransaction: Send {
    /// Append one ledger row.
    async fn insert_ledger_entry(&mut self, entry: &KarmaLedgerEntry) -> Result<()>;

    /// Add `points` to the user's `karma_score`.
    ///
    /// Must be a relative increment performed by the store, never a
    /// read-modify-write in application code. Fails if the user is unknown.
    async fn increment_karma_score(&mut self, user_id: &str, points: i64) -> Result<()>;
}

/// Record a karma change: one ledger entry plus the matching aggregate increment.
///
/// A zero delta is a no-op and writes nothing. Store errors are returned as-is;
/// the caller decides whether to roll back or retry.
pub async fn apply_karma_delta<T>(tx: &mut T, delta: KarmaDelta) -> Result<()>
where
    T: KarmaTransaction + ?Sized,
{
    if delta.points == 0 {
        return Ok(());
    }
    if delta.user_id.is_empty() {
        bail!("Karma delta has an empty user id");
    }

    let entry = KarmaLedgerEntry::from_delta(delta);
    tx.insert_ledger_entry(&entry).await?;
    tx.increment_karma_score(&entry.user_id, entry.points).await?;

    debug!(
        user_id = %entry.user_id,
        points = entry.points,
        reason = %entry.reason,
        squad_id = ?entry.squad_id,
        "Applied karma delta"
    );

    Ok(())
}

/// Fixed karma rewards for actions that are not score driven
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarmaRewards {
    /// Points for voting on a squad roadmap item
    pub roadmap_vote_points: i64,
}

impl Default for KarmaRewards {
    fn default() -> Self {
        Self {
            roadmap_vote_points: 10,
        }
    }
}

/// A change in an item's raw score, attributed to the actor who caused it
#[derive(Debug, Clone)]
pub struct ScoreChange {
    /// Author of the item; the user who earns or loses karma
    pub author_id: Option<String>,

    /// User whose action moved the score
    pub actor_id: String,

    pub prev_score: i64,
    pub next_score: i64,
    pub reason: KarmaReason,
    pub squad_id: Option<String>,
}

pub struct KarmaEngine {
    rewards: KarmaRewards,
}

impl KarmaEngine {
    pub fn new(rewards: KarmaRewards) -> Self {
        Self { rewards }
    }

    pub fn rewards(&self) -> &KarmaRewards {
        &self.rewards
    }

    /// Apply the karma consequence of an item's score change to its author.
    ///
    /// Authorless items and self-votes earn nothing. Returns the points applied.
    pub async fn apply_score_change<T>(&self, tx: &mut T, change: ScoreChange) -> Result<i64>
    where
        T: KarmaTransaction + ?Sized,
    {
        let Some(author_id) = change.author_id else {
            return Ok(0);
        };
        if author_id == change.actor_id {
            debug!(user_id = %author_id, "Skipping karma for self-vote");
            return Ok(0);
        }

        let points = karma_delta_from_scores(change.prev_score, change.next_score);
        apply_karma_delta(
            tx,
            KarmaDelta {
                user_id: author_id,
                points,
                reason: change.reason,
                squad_id: change.squad_id,
            },
        )
        .await?;

        Ok(points)
    }

    /// Reward a user for voting on a roadmap item of their squad.
    pub async fn reward_roadmap_vote<T>(
        &self,
        tx: &mut T,
        user_id: &str,
        squad_id: &str,
    ) -> Result<i64>
    where
        T: KarmaTransaction + ?Sized,
    {
        let points = self.rewards.roadmap_vote_points;
        apply_karma_delta(
            tx,
            KarmaDelta::new(user_id, points, KarmaReason::RoadmapVote).in_squad(squad_id),
        )
        .await?;

        Ok(points)
    }
}

impl Default for KarmaEngine {
    fn default() -> Self {
        Self::new(KarmaRewards::default())
    }
}
