use std::{collections::HashMap, sync::{Arc, Mutex, PoisonError}};

use agora_store::Storage;

/// A thread panicked while holding the entries lock.
#[derive(Debug)]
pub struct LockPoisoned;

impl std::fmt::Display for LockPoisoned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("mock storage entries are poisoned by a panicked writer")
    }
}

impl std::error::Error for LockPoisoned {}

impl<T> From<PoisonError<T>> for LockPoisoned {
    fn from(_value: PoisonError<T>) -> Self {
        LockPoisoned
    }
}

/// In-memory storage. Clones share the same entries, so a test can keep a handle
/// while a `Store` owns another one.
#[derive(Clone, Default)]
pub struct MockStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        MockStorage { entries: Arc::new(Mutex::new(entries)) }
    }

    pub fn entry(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

impl Storage for MockStorage {
    type Error = LockPoisoned;

    fn get(&self, key: &str) -> Result<Option<String>, LockPoisoned> {
        Ok(self.entries.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LockPoisoned> {
        self.entries.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
