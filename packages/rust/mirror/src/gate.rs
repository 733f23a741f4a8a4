//! Bounded concurrency gate for section processing.
//!
//! At most `capacity` section subtrees may be actively fetching their question
//! lists at once, however many sections the book has. Modeled as an explicit
//! object rather than an ambient semaphore so capacity, current usage, and the
//! high-water mark are inspectable in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate bounding how many holders run concurrently.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    capacity: usize,
    semaphore: Arc<Semaphore>,
    active: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
}

impl ConcurrencyGate {
    /// Gate admitting at most `capacity` concurrent holders.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            active: Arc::new(AtomicUsize::new(0)),
            high_water: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a slot. The returned permit releases its slot on drop, so a
    /// failing holder cannot deadlock the remaining ones.
    pub async fn acquire(&self) -> GatePermit {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore closed");

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        GatePermit {
            _permit: permit,
            active: Arc::clone(&self.active),
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Holders currently inside the gate.
    pub fn in_use(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Most holders ever inside the gate at once.
    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

/// RAII gate slot. Dropping it releases the slot unconditionally.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    active: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn gate_reports_capacity_and_usage() {
        let gate = ConcurrencyGate::new(3);
        assert_eq!(gate.capacity(), 3);
        assert_eq!(gate.in_use(), 0);

        let p1 = gate.acquire().await;
        let p2 = gate.acquire().await;
        assert_eq!(gate.in_use(), 2);
        assert_eq!(gate.high_water_mark(), 2);

        drop(p1);
        assert_eq!(gate.in_use(), 1);
        // High-water mark does not recede
        assert_eq!(gate.high_water_mark(), 2);

        drop(p2);
        assert_eq!(gate.in_use(), 0);
    }

    #[tokio::test]
    async fn gate_never_exceeds_capacity_under_load() {
        let gate = ConcurrencyGate::new(2);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await;
                assert!(gate.in_use() <= gate.capacity());
                tokio::time::sleep(Duration::from_millis(5)).await;
            }));
        }

        for handle in handles {
            handle.await.expect("task panicked");
        }

        assert_eq!(gate.in_use(), 0);
        assert!(gate.high_water_mark() <= 2);
        // With 20 waiters the gate was actually saturated
        assert_eq!(gate.high_water_mark(), 2);
    }

    #[tokio::test]
    async fn permit_released_on_holder_failure() {
        let gate = ConcurrencyGate::new(1);

        let task_gate = gate.clone();
        let handle = tokio::spawn(async move {
            let _permit = task_gate.acquire().await;
            panic!("holder failed");
        });
        assert!(handle.await.is_err());

        // The slot must be free again or this acquire hangs
        let _permit =
            tokio::time::timeout(Duration::from_secs(1), gate.acquire())
                .await
                .expect("gate deadlocked after holder panic");
    }
}
