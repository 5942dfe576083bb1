use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::GroupScope;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<GroupScope, Arc<AsyncMutex<()>>>>>;

/// Per-scope mutual exclusion for group writes.
///
/// Entries live only while a writer holds or waits on them.
#[derive(Default)]
pub(crate) struct ScopeLocks {
    locks: LockTable,
}

/// Exclusive write access to one scope, released on drop.
pub(crate) struct ScopeGuard {
    scope: GroupScope,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockTable,
}

impl ScopeLocks {
    /// Waits for exclusive write access to `scope`.
    pub(crate) async fn lock(&self, scope: GroupScope) -> AppResult<ScopeGuard> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| AppError::Internal("scope lock table poisoned".to_owned()))?;
            locks.entry(scope).or_default().clone()
        };

        Ok(ScopeGuard {
            scope,
            guard: Some(lock.lock_owned().await),
            locks: Arc::clone(&self.locks),
        })
    }

    #[cfg(test)]
    fn tracked_scopes(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        // Waiters clone the entry under the table lock, so a lone reference is idle.
        if locks
            .get(&self.scope)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.scope);
        }
    }
}
