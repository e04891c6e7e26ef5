//! Per-order async locks
//!
//! SQLite gives us single-writer transactions, but status transitions
//! read-then-write: two concurrent transitions on the same order could
//! both pass the legality check against a stale status. Serializing
//! per order through these mutexes closes that window; checkout,
//! capture, cancellation, and the sweeps all route through the same
//! lock for a given order.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct OrderLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one order, waiting if another operation on
    /// the same order is in flight
    pub async fn acquire(&self, order_id: i64) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
