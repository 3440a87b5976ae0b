use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Write locks for the formula store.
///
/// Mutations for one party run one at a time. On top of that a single
/// writer gate admits one write transaction at a time, since SQLite refuses
/// a second writer with `SQLITE_BUSY` instead of queueing it.
#[derive(Clone, Default)]
pub struct PartyLocks {
    locks: Arc<DashMap<i32, Arc<Mutex<()>>>>,
    writer: Arc<Mutex<()>>,
}

/// Held for the duration of a write; releases both locks on drop
pub struct WriteGuard {
    _writer: OwnedMutexGuard<()>,
    _party: Option<OwnedMutexGuard<()>>,
}

impl PartyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `party_id`, then the writer gate
    pub async fn lock(&self, party_id: i32) -> WriteGuard {
        // Clone the Arc out so the map shard is not held across the await
        let lock = self
            .locks
            .entry(party_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let party = lock.lock_owned().await;

        WriteGuard {
            _writer: self.writer.clone().lock_owned().await,
            _party: Some(party),
        }
    }

    /// Writer gate alone, for writes not yet tied to a party id
    pub async fn lock_writer(&self) -> WriteGuard {
        WriteGuard {
            _writer: self.writer.clone().lock_owned().await,
            _party: None,
        }
    }

    /// Drop the lock entry of a party that no longer exists
    pub fn forget(&self, party_id: i32) {
        self.locks.remove(&party_id);
    }
}
