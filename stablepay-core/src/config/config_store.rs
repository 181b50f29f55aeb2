//! Snapshot config store.
//!
//! `ConfigStore<T>` hands out `Arc<T>` snapshots: a reader keeps a
//! consistent view for as long as it holds the snapshot, even if a reload
//! swaps the stored value underneath it.

use std::sync::Arc;
use tokio::sync::watch;

/// A shared, versioned configuration store.
///
/// Cloning the store is cheap and every clone observes the same value.
pub struct ConfigStore<T> {
    tx: Arc<watch::Sender<Snapshot<T>>>,
}

struct Snapshot<T> {
    version: u64,
    value: Arc<T>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> ConfigStore<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(Snapshot {
            version: 0,
            value: Arc::new(initial),
        });
        Self { tx: Arc::new(tx) }
    }

    /// Publish `value` as the new snapshot.
    pub fn update(&self, value: T) {
        let value = Arc::new(value);
        self.tx.send_modify(|snapshot| {
            snapshot.version += 1;
            snapshot.value = value;
        });
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.tx.borrow().value)
    }

    /// How many times the store has been updated.
    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}
