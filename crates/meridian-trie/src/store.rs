//! Key/value store interface.
//!
//! Persistent storage is an external collaborator; this module specifies
//! only the boundary the Merkle tree's contents cross. Writes arrive as
//! whole-block batches, which must land atomically so that a crash
//! mid-commit leaves the previously committed snapshot intact. `MemStore`
//! is the in-process implementation used by tests and ephemeral nodes.

use std::collections::BTreeMap;
use std::sync::Mutex;

use meridian_core::error::MeridianError;

/// Opaque byte-oriented storage. One batch per block.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MeridianError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), MeridianError>;

    /// Apply every write in one atomic step.
    fn apply_batch(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), MeridianError>;
}

// ── MemStore ─────────────────────────────────────────────────────────────────

/// In-memory store for tests and ephemeral nodes.
#[derive(Default)]
pub struct MemStore {
    map: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MeridianError> {
        Ok(self.map.lock().expect("store lock poisoned").get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), MeridianError> {
        self.map
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn apply_batch(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), MeridianError> {
        let mut map = self.map.lock().expect("store lock poisoned");
        for (k, v) in writes {
            map.insert(k, v);
        }
        Ok(())
    }
}
