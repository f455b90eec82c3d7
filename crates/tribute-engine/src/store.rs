//! Keyed generation-status store.
//!
//! Replaces ambient global state with an injected store. The default
//! implementation is an in-process map with TTL eviction; a deployment with
//! external storage implements the same trait.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tribute_models::{CacheKey, GenerationStatus};

/// Transient keyed status storage.
pub trait StatusStore: Send + Sync {
    /// Current status for a key, if present and not expired.
    fn get(&self, key: &CacheKey) -> Option<GenerationStatus>;

    /// Overwrite the status for a key.
    fn set(&self, key: &CacheKey, status: GenerationStatus);

    /// Remove the status for a key.
    fn clear(&self, key: &CacheKey);

    /// Atomically install `status` unless a non-terminal entry already
    /// exists for the key. Returns false when a job is already in flight,
    /// guarding against duplicate launches under near-simultaneous requests.
    fn begin(&self, key: &CacheKey, status: GenerationStatus) -> bool;
}

struct Entry {
    status: GenerationStatus,
    expires_at: Instant,
}

/// In-memory status store with per-entry TTL.
pub struct MemoryStatusStore {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl MemoryStatusStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }
}

impl StatusStore for MemoryStatusStore {
    fn get(&self, key: &CacheKey) -> Option<GenerationStatus> {
        let mut entries = self.entries.lock().expect("status store poisoned");
        match entries.get(key.as_str()) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.status.clone()),
            Some(_) => {
                entries.remove(key.as_str());
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &CacheKey, status: GenerationStatus) {
        let mut entries = self.entries.lock().expect("status store poisoned");
        entries.insert(
            key.as_str().to_string(),
            Entry {
                status,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    fn clear(&self, key: &CacheKey) {
        let mut entries = self.entries.lock().expect("status store poisoned");
        entries.remove(key.as_str());
    }

    fn begin(&self, key: &CacheKey, status: GenerationStatus) -> bool {
        let mut entries = self.entries.lock().expect("status store poisoned");
        if let Some(entry) = entries.get(key.as_str()) {
            if entry.expires_at > Instant::now() && !entry.status.is_terminal() {
                return false;
            }
        }
        entries.insert(
            key.as_str().to_string(),
            Entry {
                status,
                expires_at: Instant::now() + self.ttl,
            },
        );
        true
    }
}
