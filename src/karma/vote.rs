//! Forum vote resolution
//!
//! A user holds at most one vote per post. Clicking the same arrow again
//! undoes the vote, clicking the other arrow switches it.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn value(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl TryFrom<i64> for VoteDirection {
    type Error = anyhow::Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(VoteDirection::Up),
            -1 => Ok(VoteDirection::Down),
            other => bail!("Invalid vote {}: expected 1 or -1", other),
        }
    }
}

/// Effect of a vote request on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Change to the post's raw score
    pub score_delta: i64,

    /// The voter's vote after the request (`None` once undone)
    pub vote: Option<VoteDirection>,
}

impl VoteOutcome {
    /// Post score after the vote, clamped to the `i64` range
    pub fn next_score(&self, prev_score: i64) -> i64 {
        prev_score.saturating_add(self.score_delta)
    }
}

pub fn resolve_vote(existing: Option<VoteDirection>, requested: VoteDirection) -> VoteOutcome {
    match existing {
        None => VoteOutcome {
            score_delta: requested.value(),
            vote: Some(requested),
        },
        Some(current) if current == requested => VoteOutcome {
            score_delta: -requested.value(),
            vote: None,
        },
        Some(_) => VoteOutcome {
            score_delta: 2 * requested.value(),
            vote: Some(requested),
        },
    }
}
