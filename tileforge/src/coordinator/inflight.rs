//! In-flight generation table.
//!
//! Maps each key currently being generated to a broadcast channel. The first
//! caller for a key becomes the owner and receives a [`PublishGuard`]; later
//! callers subscribe to the same channel and wait for the owner's result.
//!
//! ```text
//! resolve(k) A ─┐
//!               │                         generation task
//! resolve(k) B ─┼──► InFlightTable ──────► (one per key)
//!               │         │                     │
//! resolve(k) C ─┘         ▼                     ▼
//!                 [A, B, C receive  ◄──── publish(outcome)
//!                  the same outcome]
//! ```
//!
//! Subscribing and publishing both happen under the table lock, so a caller
//! either joins before the result is sent or finds no entry and starts a
//! fresh resolve. The lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::coordinator::outcome::{FailureReason, Outcome};
use crate::key::TileKey;

/// Registration result for one caller.
pub(crate) enum Registration {
    /// First caller: must run the generation and publish through the guard.
    Owner(PublishGuard, broadcast::Receiver<Outcome>),
    /// Generation already running: wait on the receiver.
    Joined(broadcast::Receiver<Outcome>),
}

/// Coalescing statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InFlightStats {
    /// Generations started.
    pub owners: u64,
    /// Callers that joined an existing generation.
    pub joined: u64,
    /// Keys currently being generated.
    pub in_flight: usize,
}

#[derive(Debug, Default)]
pub(crate) struct InFlightTable {
    entries: Mutex<HashMap<TileKey, broadcast::Sender<Outcome>>>,
    owners: AtomicU64,
    joined: AtomicU64,
}

impl InFlightTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Joins the generation for `key`, creating it if none is running.
    pub(crate) fn register(self: &Arc<Self>, key: &TileKey) -> Registration {
        let mut entries = self.entries.lock();
        if let Some(sender) = entries.get(key) {
            self.joined.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Joining in-flight generation");
            return Registration::Joined(sender.subscribe());
        }

        // Capacity 1 suffices: exactly one value is ever sent.
        let (sender, receiver) = broadcast::channel(1);
        entries.insert(key.clone(), sender);
        self.owners.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, in_flight = entries.len(), "Starting new generation");

        Registration::Owner(
            PublishGuard {
                table: Arc::clone(self),
                key: key.clone(),
                published: false,
            },
            receiver,
        )
    }

    /// Removes the entry and sends the outcome to every subscriber.
    fn publish(&self, key: &TileKey, outcome: Outcome) {
        let mut entries = self.entries.lock();
        if let Some(sender) = entries.remove(key) {
            let waiters = sender.receiver_count();
            // Send fails only when nobody is listening any more.
            let _ = sender.send(outcome);
            debug!(key = %key, waiters = waiters, "Published generation outcome");
        }
    }

    pub(crate) fn contains(&self, key: &TileKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub(crate) fn stats(&self) -> InFlightStats {
        InFlightStats {
            owners: self.owners.load(Ordering::Relaxed),
            joined: self.joined.load(Ordering::Relaxed),
            in_flight: self.entries.lock().len(),
        }
    }
}

/// Owner's obligation to publish exactly one outcome for a key.
///
/// Dropping the guard without publishing (panic, task abort, runtime
/// shutdown) publishes `Failed(Aborted)` so waiters are released and the
/// entry is removed.
pub(crate) struct PublishGuard {
    table: Arc<InFlightTable>,
    key: TileKey,
    published: bool,
}

impl PublishGuard {
    pub(crate) fn key(&self) -> &TileKey {
        &self.key
    }

    pub(crate) fn publish(mut self, outcome: Outcome) {
        self.published = true;
        self.table.publish(&self.key, outcome);
    }
}

impl Drop for PublishGuard {
    fn drop(&mut self) {
        if !self.published {
            warn!(key = %self.key, "Generation ended without publishing; releasing waiters");
            self.table
                .publish(&self.key, Outcome::Failed(FailureReason::Aborted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> TileKey {
        TileKey::terrain(1, 8, 0, 0)
    }

    #[tokio::test]
    async fn test_first_caller_owns_later_callers_join() {
        let table = Arc::new(InFlightTable::new());

        let Registration::Owner(guard, mut owner_rx) = table.register(&key()) else {
            panic!("first caller must own");
        };
        let Registration::Joined(mut joiner_rx) = table.register(&key()) else {
            panic!("second caller must join");
        };
        assert!(table.contains(&key()));

        guard.publish(Outcome::NotFound);

        assert_eq!(owner_rx.recv().await.unwrap(), Outcome::NotFound);
        assert_eq!(joiner_rx.recv().await.unwrap(), Outcome::NotFound);
        assert!(!table.contains(&key()));

        let stats = table.stats();
        assert_eq!(stats.owners, 1);
        assert_eq!(stats.joined, 1);
        assert_eq!(stats.in_flight, 0);
    }

    #[tokio::test]
    async fn test_dropped_guard_publishes_aborted() {
        let table = Arc::new(InFlightTable::new());
        let Registration::Owner(guard, mut rx) = table.register(&key()) else {
            panic!("first caller must own");
        };

        drop(guard);

        assert_eq!(
            rx.recv().await.unwrap(),
            Outcome::Failed(FailureReason::Aborted)
        );
        assert!(!table.contains(&key()));
    }

    #[tokio::test]
    async fn test_panicking_task_releases_waiters() {
        let table = Arc::new(InFlightTable::new());
        let Registration::Owner(guard, mut rx) = table.register(&key()) else {
            panic!("first caller must own");
        };

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("generation blew up");
        });
        assert!(handle.await.is_err());

        assert_eq!(
            rx.recv().await.unwrap(),
            Outcome::Failed(FailureReason::Aborted)
        );
    }

    #[test]
    fn test_register_after_publish_starts_fresh() {
        let table = Arc::new(InFlightTable::new());
        let Registration::Owner(guard, _rx) = table.register(&key()) else {
            panic!("first caller must own");
        };
        guard.publish(Outcome::NotFound);

        assert!(matches!(
            table.register(&key()),
            Registration::Owner(_, _)
        ));
    }
}
