//! In-memory implementations of the core ports.
//!
//! Used by tests and by callers that do not need the data to outlive the
//! process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ports::{Notification, NotificationService, PortError, PortResult, StorageService};

/// A `HashMap`-backed key-value store.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent `set`/`remove` fail, the way a full browser
    /// quota would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self, key: &str) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Storage(format!(
                "write to '{}' rejected: quota exceeded",
                key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageService for InMemoryStorage {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.check_writable(key)?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.check_writable(key)?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Keeps every toast it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }
}

impl NotificationService for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut list) = self.received.lock() {
            list.push(notification);
        }
    }
}
