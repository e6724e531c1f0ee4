//! In-memory credential storage implementation.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{CredentialRecord, CredentialStore, StoreError};

/// In-memory credential store for testing and development.
///
/// This store is not persistent; data is lost when the process exits.
/// Saves can be made to fail on demand to exercise best-effort persistence.
#[derive(Default)]
pub struct MemoryCredentialStore {
    record: Mutex<Option<CredentialRecord>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryCredentialStore {
    /// Create an empty store. Loading from it fails with `NotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given record.
    pub fn with_record(record: CredentialRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail with a backend error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Snapshot of the currently stored record.
    pub fn snapshot(&self) -> Option<CredentialRecord> {
        self.record.lock().clone()
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("has_record", &self.record.lock().is_some())
            .field("saves", &self.save_count())
            .finish()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<CredentialRecord, StoreError> {
        self.record.lock().clone().ok_or_else(|| StoreError::NotFound {
            location: "memory".to_string(),
        })
    }

    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::BackendError {
                message: "memory store configured to reject saves".to_string(),
            });
        }
        *self.record.lock() = Some(record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
