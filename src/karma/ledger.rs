//! Karma Ledger Types
//!
//! The ledger is the append-only source of truth; `UserKarmaState` is the
//! eagerly maintained aggregate that must always equal the fold of a user's
//! ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Origin of a karma change
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KarmaReason {
    /// Score of a forum post authored by the user changed
    ForumPostVote,

    /// User voted on a squad roadmap item
    RoadmapVote,

    /// Free-text reason supplied by the caller
    Custom(String),
}

impl KarmaReason {
    pub fn as_str(&self) -> &str {
        match self {
            KarmaReason::ForumPostVote => "forum_post_vote",
            KarmaReason::RoadmapVote => "roadmap_vote",
            KarmaReason::Custom(reason) => reason,
        }
    }

    /// Parse a stored tag. Unknown tags are kept verbatim.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "forum_post_vote" => KarmaReason::ForumPostVote,
            "roadmap_vote" => KarmaReason::RoadmapVote,
            other => KarmaReason::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for KarmaReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for KarmaReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KarmaReason {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(KarmaReason::from_tag(&tag))
    }
}

/// A karma change to apply to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaDelta {
    pub user_id: String,
    pub points: i64,
    pub reason: KarmaReason,
    pub squad_id: Option<String>,
}

impl KarmaDelta {
    pub fn new(user_id: impl Into<String>, points: i64, reason: KarmaReason) -> Self {
        Self {
            user_id: user_id.into(),
            points,
            reason,
            squad_id: None,
        }
    }

    pub fn in_squad(mut self, squad_id: impl Into<String>) -> Self {
        self.squad_id = Some(squad_id.into());
        self
    }
}

/// Immutable, append-only record of one reputation change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaLedgerEntry {
    pub id: Uuid,
    pub user_id: String,

    /// Signed, never zero
    pub points: i64,

    pub reason: KarmaReason,

    /// Squad the event is scoped to, `None` for global events
    pub squad_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl KarmaLedgerEntry {
    pub fn from_delta(delta: KarmaDelta) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: delta.user_id,
            points: delta.points,
            reason: delta.reason,
            squad_id: delta.squad_id,
            created_at: Utc::now(),
        }
    }
}

/// Cached running karma total for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserKarmaState {
    pub user_id: String,
    pub karma_score: i64,
    pub updated_at: DateTime<Utc>,
}

impl UserKarmaState {
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            karma_score: 0,
            updated_at: Utc::now(),
        }
    }

    /// Value the aggregate must hold: the sum of the user's ledger points.
    /// Entries belonging to other users are ignored.
    pub fn fold<'a>(
        user_id: &str,
        entries: impl IntoIterator<Item = &'a KarmaLedgerEntry>,
    ) -> Self {
        let mut state = Self::new(user_id.to_string());
        let mut latest: Option<DateTime<Utc>> = None;
        for entry in entries.into_iter().filter(|e| e.user_id == user_id) {
            state.karma_score += entry.points;
            latest = latest.max(Some(entry.created_at));
        }
        if let Some(latest) = latest {
            state.updated_at = latest;
        }
        state
    }
}
