//! Pass serial allocation.

use crate::store::SequenceStore;
use crate::GatepassError;
use std::sync::Arc;
use tracing::debug;

/// Draws unique, strictly increasing serials from one shared counter.
///
/// Serials come only from the store's atomic increment; nothing is cached
/// or reconstructed locally, so replicas never hand out the same value.
/// Store failures are returned as-is; retrying is the caller's decision.
pub struct SequenceAllocator {
    store: Arc<dyn SequenceStore>,
    counter: &'static str,
}

impl SequenceAllocator {
    /// Allocator over `counter` in `store`.
    pub fn new(store: Arc<dyn SequenceStore>, counter: &'static str) -> Self {
        Self { store, counter }
    }

    /// Allocate the next serial.
    ///
    /// # Errors
    /// - `StorageUnavailable` - the counter store could not be reached
    pub fn allocate(&self) -> Result<u64, GatepassError> {
        let serial = self.store.next_value(self.counter)?;
        if serial == 0 {
            return Err(GatepassError::StorageUnavailable(format!(
                "counter {} returned a non-positive serial",
                self.counter
            )));
        }
        debug!(counter = self.counter, serial, "serial allocated");
        Ok(serial)
    }

    /// Name of the backing counter.
    pub fn counter(&self) -> &'static str {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn serials_start_at_one_and_increase() {
        let allocator = SequenceAllocator::new(Arc::new(InMemoryStore::new()), "pass_serial");
        let serials: Vec<u64> = (0..5).map(|_| allocator.allocate().unwrap()).collect();
        assert_eq!(serials, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn outage_is_surfaced_not_retried() {
        let store = Arc::new(InMemoryStore::new());
        let allocator = SequenceAllocator::new(store.clone(), "pass_serial");
        assert_eq!(allocator.allocate().unwrap(), 1);

        store.set_available(false);
        let err = allocator.allocate().unwrap_err();
        assert!(err.is_retryable());

        store.set_available(true);
        assert_eq!(allocator.allocate().unwrap(), 2);
    }

    #[test]
    fn allocators_sharing_a_counter_never_collide() {
        let store = Arc::new(InMemoryStore::new());
        let a = SequenceAllocator::new(store.clone(), "pass_serial");
        let b = SequenceAllocator::new(store, "pass_serial");
        assert_eq!(a.allocate().unwrap(), 1);
        assert_eq!(b.allocate().unwrap(), 2);
        assert_eq!(a.allocate().unwrap(), 3);
    }
}
