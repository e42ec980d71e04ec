use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

/// Process-wide value created on first successful access and kept until exit.
///
/// Readers only take the shared lock once the value exists. The first caller
/// that finds the slot empty takes the upgradable lock, which admits one
/// initializer at a time while plain readers keep going; the write lock is
/// only held for the store itself. A failed initializer leaves the slot empty.
pub struct LazyShared<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> LazyShared<T> {
    pub const fn new() -> Self {
        Self {
            slot: parking_lot::const_rwlock(None),
        }
    }

    /// Returns the value if some caller already initialized it.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.read().clone()
    }

    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        if let Some(value) = self.slot.read().as_ref() {
            return Ok(Arc::clone(value));
        }

        let guard = self.slot.upgradable_read();
        // Another initializer may have finished while we waited.
        if let Some(value) = guard.as_ref() {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(init()?);
        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        *guard = Some(Arc::clone(&value));
        Ok(value)
    }
}

impl<T> Default for LazyShared<T> {
    fn default() -> Self {
        Self::new()
    }
}
