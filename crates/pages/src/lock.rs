use shelf_extract::BookId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per book identifier.
///
/// Work on the same book is serialized, work on different books never
/// contends. Entries only live as long as someone holds or waits on them.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyedLock {
    locks: Arc<SyncMutex<HashMap<BookId, Weak<Mutex<()>>>>>,
}
impl KeyedLock {
    pub(crate) async fn lock(&self, id: &BookId) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| lock.strong_count() > 0);
            match locks.get(id).and_then(Weak::upgrade) {
                Some(mutex) => mutex,
                None => {
                    let mutex = Arc::new(Mutex::new(()));
                    locks.insert(id.clone(), Arc::downgrade(&mutex));
                    mutex
                },
            }
        };
        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.values().filter(|lock| lock.strong_count() > 0).count()
    }
}
