use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!(
            target: "veneer::cache",
            op,
            lock_kind = "rwlock.read",
            "Recovered poisoned output cache lock; entries may be stale"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn rw_write<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!(
            target: "veneer::cache",
            op,
            lock_kind = "rwlock.write",
            "Recovered poisoned output cache lock; entries may be stale"
        );
        poisoned.into_inner()
    })
}
