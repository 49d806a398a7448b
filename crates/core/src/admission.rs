//! Bounded-concurrency admission gate.
//!
//! A fixed number of render slots, acquired without waiting. A slot is held
//! by an [`AdmissionPermit`] and returned when the permit is dropped, so
//! every exit path of the holder (early return, error, panic unwind, task
//! abort) releases it exactly once.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// Proof of an acquired slot. Dropping it releases the slot.
#[derive(Debug)]
#[must_use = "dropping the permit releases the slot immediately"]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots. Capacity is fixed for the
    /// lifetime of the gate.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Take a slot if one is free. Never waits.
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        Arc::clone(&self.slots)
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_beyond_capacity() {
        let gate = AdmissionGate::new(2);
        let a = gate.try_acquire();
        let b = gate.try_acquire();
        assert!(a.is_some());
        assert!(b.is_some());
        assert!(gate.try_acquire().is_none());
        assert_eq!(gate.in_flight(), 2);
        assert_eq!(gate.available(), 0);
    }

    #[test]
    fn dropping_permit_releases_slot() {
        let gate = AdmissionGate::new(1);
        let permit = gate.try_acquire().unwrap();
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert_eq!(gate.available(), 1);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn clones_share_the_same_slots() {
        let gate = AdmissionGate::new(1);
        let other = gate.clone();
        let _permit = gate.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
        assert_eq!(other.capacity(), 1);
    }

    #[test]
    fn slot_is_released_when_holder_panics() {
        let gate = AdmissionGate::new(1);
        let inner = gate.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _permit = inner.try_acquire().unwrap();
            panic!("render crashed");
        }));
        assert!(result.is_err());
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn concurrent_acquires_never_exceed_capacity() {
        let gate = AdmissionGate::new(3);
        let mut handles = Vec::new();
        for _ in 0..32 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move { gate.try_acquire() }));
        }

        let mut held = Vec::new();
        for handle in handles {
            if let Some(permit) = handle.await.unwrap() {
                held.push(permit);
            }
        }
        assert_eq!(held.len(), 3);

        held.clear();
        assert_eq!(gate.available(), 3);
    }
}
