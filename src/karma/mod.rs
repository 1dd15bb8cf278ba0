//! Karma Reputation System
//!
//! Turns raw vote tallies into sub-linear karma and records every change in
//! an append-only ledger alongside a cached per-user total.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌─────────────────────┐
//! │ VoteOutcome     │────►│ KarmaEngine      │────►│ KarmaTransaction    │
//! │ (score change)  │     │ (score -> karma) │     │ (ledger + aggregate)│
//! └─────────────────┘     └──────────────────┘     └─────────────────────┘
//!                                                            │
//!                                        ┌───────────────────┴──────────┐
//!                                        ▼                              ▼
//!                               ┌─────────────────┐          ┌──────────────────┐
//!                               │ Postgres tx     │          │ MemoryKarmaTx    │
//!                               └─────────────────┘          └──────────────────┘
//! ```
//!
//! ## Karma Model
//!
//! - karma(score) = sign(score) * round(|score| ^ 0.8), karma(0) = 0
//! - Only the marginal change `karma(next) - karma(prev)` is ever applied
//! - Zero changes are never written to the ledger
//! - The aggregate only moves by relative increments, in the same
//!   transaction as its ledger entry

mod engine;
mod ledger;
mod score;
mod vote;

pub use engine::{apply_karma_delta, KarmaEngine, KarmaRewards, KarmaTransaction, ScoreChange};
pub use ledger::{KarmaDelta, KarmaLedgerEntry, KarmaReason, UserKarmaState};
pub use score::{karma_delta_from_scores, karma_magnitude, score_to_karma, KARMA_EXPONENT};
pub use vote::{resolve_vote, VoteDirection, VoteOutcome};
