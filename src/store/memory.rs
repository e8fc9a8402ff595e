//! In-process key/value store.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use log::trace;

use crate::store::{Session, Store, StoreError};

type Data = Arc<Mutex<HashMap<String, String>>>;

/// Key/value store living in memory for the lifetime of the process.
///
/// The store counts opened and released sessions, which makes leaked scopes
/// observable.
///
/// # Examples
///
/// ```
/// # use strea::store::{MemoryStore, Store};
/// let store = MemoryStore::new();
/// let session = store.open_session();
/// session.put("greeting", "hello").unwrap();
/// session.commit().unwrap();
/// session.release();
///
/// assert_eq!(store.open_session().get("greeting").as_deref(), Some("hello"));
/// ```
#[derive(Default)]
pub struct MemoryStore {
    /// Committed data
    data: Data,
    /// Number of sessions opened so far
    opened: Arc<AtomicUsize>,
    /// Number of sessions released so far
    released: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of sessions opened since the store was created.
    pub fn opened_sessions(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of sessions released since the store was created.
    pub fn released_sessions(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Number of sessions currently open.
    pub fn active_sessions(&self) -> usize {
        self.opened_sessions()
            .saturating_sub(self.released_sessions())
    }
}

impl Store for MemoryStore {
    fn open_session(&self) -> Arc<dyn Session> {
        let id = self.opened.fetch_add(1, Ordering::SeqCst);
        trace!("opening memory session {}", id);

        Arc::new(MemorySession {
            id,
            data: Arc::clone(&self.data),
            staged: Mutex::new(HashMap::new()),
            is_released: AtomicBool::new(false),
            released: Arc::clone(&self.released),
        })
    }
}

/// Session over a [`MemoryStore`].
struct MemorySession {
    id: usize,
    data: Data,
    /// Pending writes, `None` marks a deletion
    staged: Mutex<HashMap<String, Option<String>>>,
    is_released: AtomicBool,
    released: Arc<AtomicUsize>,
}

impl MemorySession {
    fn staged(&self) -> MutexGuard<'_, HashMap<String, Option<String>>> {
        self.staged.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stage(&self, key: &str, value: Option<String>) -> Result<(), StoreError> {
        if self.is_released.load(Ordering::SeqCst) {
            return Err(StoreError::Released);
        }
        self.staged().insert(key.to_string(), value);
        Ok(())
    }
}

impl Session for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(staged) = self.staged().get(key) {
            return staged.clone();
        }
        self.data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.stage(key, Some(value.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.stage(key, None)
    }

    fn commit(&self) -> Result<(), StoreError> {
        if self.is_released.load(Ordering::SeqCst) {
            return Err(StoreError::Released);
        }

        let staged: Vec<_> = self.staged().drain().collect();
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        for (key, value) in staged {
            match value {
                Some(value) => data.insert(key, value),
                None => data.remove(&key),
            };
        }

        trace!("memory session {} committed", self.id);
        Ok(())
    }

    fn release(&self) {
        if self.is_released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.staged().clear();
        self.released.fetch_add(1, Ordering::SeqCst);
        trace!("memory session {} released", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committed_writes_are_visible_to_other_sessions() {
        let store = MemoryStore::new();
        let writer = store.open_session();
        writer.put("key", "value").unwrap();

        let reader = store.open_session();
        assert!(reader.get("key").is_none());
        assert_eq!(writer.get("key").as_deref(), Some("value"));

        writer.commit().unwrap();
        assert_eq!(reader.get("key").as_deref(), Some("value"));
    }

    #[test]
    fn test_release_discards_uncommitted_writes() {
        let store = MemoryStore::new();
        let session = store.open_session();
        session.put("key", "value").unwrap();
        session.release();

        assert!(store.open_session().get("key").is_none());
        assert_eq!(session.put("key", "other"), Err(StoreError::Released));
        assert_eq!(session.commit(), Err(StoreError::Released));
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        let session = store.open_session();
        session.put("key", "value").unwrap();
        session.commit().unwrap();

        session.delete("key").unwrap();
        assert!(session.get("key").is_none());
        session.commit().unwrap();

        assert!(store.open_session().get("key").is_none());
    }

    #[test]
    fn test_session_counters() {
        let store = MemoryStore::new();
        let first = store.open_session();
        let second = store.open_session();
        assert_eq!(store.opened_sessions(), 2);
        assert_eq!(store.active_sessions(), 2);

        first.release();
        // Releasing twice is counted once
        first.release();
        assert_eq!(store.released_sessions(), 1);
        assert_eq!(store.active_sessions(), 1);

        second.release();
        assert_eq!(store.active_sessions(), 0);
    }
}
