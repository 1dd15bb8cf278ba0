//! Forge Karma
//!
//! Reputation scoring for the Forge venture studio platform: vote tallies
//! become sub-linear karma, and every karma change is recorded in an
//! append-only ledger together with a cached per-user total.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Schema bootstrap entrypoint
//! ├── config.rs      - Configuration management
//! ├── karma/         - Karma reputation system
//! │   ├── score.rs   - Score-to-karma transform
//! │   ├── ledger.rs  - Ledger entries, deltas & aggregates
//! │   ├── vote.rs    - Forum vote resolution
//! │   └── engine.rs  - Transactional karma application
//! └── database/      - Persistence
//!     ├── pool.rs    - PostgreSQL connection pool
//!     ├── karma.rs   - Karma repository & Postgres transaction scope
//!     └── memory.rs  - In-memory store
//! ```

pub mod config;
pub mod database;
pub mod karma;

// Re-export main types for convenience
pub use config::KarmaConfig;
pub use database::{DatabasePool, KarmaRepository, MemoryKarmaStore, MemoryKarmaTx};
pub use karma::{
    apply_karma_delta, karma_delta_from_scores, resolve_vote, score_to_karma, KarmaDelta,
    KarmaEngine, KarmaLedgerEntry, KarmaReason, KarmaRewards, KarmaTransaction, ScoreChange,
    UserKarmaState, VoteDirection, VoteOutcome,
};
