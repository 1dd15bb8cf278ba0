//! In-memory karma store
//!
//! Used when PostgreSQL is disabled and in tests. Transactions buffer their
//! writes and apply them all under one write lock on commit; dropping a
//! transaction without committing discards everything it wrote. Once any
//! write fails the transaction is aborted and `commit` refuses to apply it.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::karma::{KarmaLedgerEntry, KarmaTransaction, UserKarmaState};

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, UserKarmaState>,
    ledger: Vec<KarmaLedgerEntry>,
}

#[derive(Clone, Default)]
pub struct MemoryKarmaStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryKarmaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with a zero karma score. Existing users are left untouched.
    pub async fn create_user(&self, user_id: &str) {
        let mut state = self.state.write().await;
        state
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserKarmaState::new(user_id.to_string()));
    }

    /// Open a transaction against this store
    pub fn begin(&self) -> MemoryKarmaTx {
        MemoryKarmaTx {
            store: self.clone(),
            pending: Vec::new(),
            failed: false,
        }
    }

    pub async fn karma_score(&self, user_id: &str) -> Option<i64> {
        let state = self.state.read().await;
        state.users.get(user_id).map(|u| u.karma_score)
    }

    pub async fn get_state(&self, user_id: &str) -> Option<UserKarmaState> {
        let state = self.state.read().await;
        state.users.get(user_id).cloned()
    }

    /// Ledger entries for a user, oldest first
    pub async fn ledger_entries(&self, user_id: &str) -> Vec<KarmaLedgerEntry> {
        let state = self.state.read().await;
        state
            .ledger
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn user_exists(&self, user_id: &str) -> bool {
        self.state.read().await.users.contains_key(user_id)
    }
}

enum PendingWrite {
    Ledger(KarmaLedgerEntry),
    Increment { user_id: String, points: i64 },
}

pub struct MemoryKarmaTx {
    store: MemoryKarmaStore,
    pending: Vec<PendingWrite>,
    failed: bool,
}

impl MemoryKarmaTx {
    /// Number of buffered writes not yet committed
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Whether an earlier write failed and aborted this transaction
    pub fn is_aborted(&self) -> bool {
        self.failed
    }

    /// Apply all buffered writes atomically
    pub async fn commit(self) -> Result<()> {
        if self.failed {
            return Err(anyhow!(
                "Transaction aborted by an earlier failed write, {} writes discarded",
                self.pending.len()
            ));
        }

        let mut state = self.store.state.write().await;

        // Validate before touching anything so a failed commit leaves no trace
        {
            let mut totals: HashMap<&str, i64> = HashMap::new();
            for write in &self.pending {
                match write {
                    PendingWrite::Ledger(entry) => {
                        if !state.users.contains_key(&entry.user_id) {
                            return Err(anyhow!("User {} not found", entry.user_id));
                        }
                    }
                    PendingWrite::Increment { user_id, points } => {
                        let user = state
                            .users
                            .get(user_id)
                            .ok_or_else(|| anyhow!("User {} not found", user_id))?;
                        let total = totals.entry(user_id.as_str()).or_insert(user.karma_score);
                        *total = total.checked_add(*points).ok_or_else(|| {
                            anyhow!("Karma score out of range for user {}", user_id)
                        })?;
                    }
                }
            }
        }

        let count = self.pending.len();
        let now = Utc::now();
        for write in self.pending {
            match write {
                PendingWrite::Ledger(entry) => state.ledger.push(entry),
                PendingWrite::Increment { user_id, points } => {
                    if let Some(user) = state.users.get_mut(&user_id) {
                        user.karma_score += points;
                        user.updated_at = now;
                    }
                }
            }
        }

        debug!(writes = count, "Committed in-memory karma transaction");
        Ok(())
    }

    /// Discard all buffered writes
    pub fn rollback(self) {
        debug!(
            writes = self.pending.len(),
            "Rolled back in-memory karma transaction"
        );
    }
}

#[async_trait]
impl KarmaTransaction for MemoryKarmaTx {
    async fn insert_ledger_entry(&mut self, entry: &KarmaLedgerEntry) -> Result<()> {
        self.pending.push(PendingWrite::Ledger(entry.clone()));
        Ok(())
    }

    async fn increment_karma_score(&mut self, user_id: &str, points: i64) -> Result<()> {
        if !self.store.user_exists(user_id).await {
            self.failed = true;
            return Err(anyhow!("User {} not found", user_id));
        }
        self.pending.push(PendingWrite::Increment {
            user_id: user_id.to_string(),
            points,
        });
        Ok(())
    }
}
