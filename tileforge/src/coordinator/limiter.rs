//! Concurrency limiter for origin fetches.
//!
//! One limiter exists per tile kind. A generation acquires a permit before
//! invoking its origin and releases it by dropping the permit, so every exit
//! path (success, error, panic, cancellation) gives the slot back.
//!
//! ```text
//! Terrain limiter:   [■][■][■]      capacity 3
//! Elevation limiter: [■][■][ ][ ]   capacity 4
//! Imagery limiter:   [■][ ]         capacity 2
//! ```
//!
//! Waiters are served in FIFO order by the underlying semaphore.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

/// Bounded concurrency gate for one tile kind.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    /// Uses Arc so permits are 'static and can move into spawned tasks.
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    label: String,
}

impl ConcurrencyLimiter {
    /// Creates a limiter admitting at most `capacity` concurrent holders.
    ///
    /// A capacity of zero is raised to one so requests can make progress.
    pub fn new(capacity: usize, label: impl Into<String>) -> Self {
        let capacity = capacity.max(1);
        let label = label.into();
        info!(capacity = capacity, label = %label, "Created concurrency limiter");
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            label,
        }
    }

    /// Waits for a free slot.
    ///
    /// Returns `None` only if the limiter has been closed.
    pub async fn acquire(&self) -> Option<LimiterPermit> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;
        Some(self.track(permit))
    }

    /// Takes a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<LimiterPermit> {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;
        Some(self.track(permit))
    }

    fn track(&self, permit: OwnedSemaphorePermit) -> LimiterPermit {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        debug!(label = %self.label, in_flight = now, "Limiter slot acquired");
        LimiterPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Closes the limiter; pending and future acquisitions return `None`.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of permits ever held at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// RAII slot; dropping it frees the slot.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for LimiterPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
