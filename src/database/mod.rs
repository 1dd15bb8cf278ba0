//! Karma persistence
//!
//! PostgreSQL storage for the karma ledger and user aggregates, plus an
//! in-memory store with the same transactional behaviour.

pub mod karma;
pub mod memory;
pub mod pool;

pub use karma::KarmaRepository;
pub use memory::{MemoryKarmaStore, MemoryKarmaTx};
pub use pool::DatabasePool;
