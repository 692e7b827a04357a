use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;

use super::{Algorithm, VerificationKey};

/// A public key fetched from the remote signer.
#[derive(Debug)]
pub struct CachedKey {
    pub key: VerificationKey,
    pub fetched_at: SystemTime,
}

/// Verification keys by algorithm and fully-qualified key-version name.
///
/// The algorithm is part of the key because one cache is shared by every
/// KMS-backed method: a P-256 key cached for ES256 is never handed to RS256.
///
/// Entries are added on first use and never evicted; there is no TTL and no
/// size bound. A key version rotated or disabled remotely keeps verifying from
/// here until the process restarts.
///
/// Concurrent misses on the same key version may each fetch and insert; the
/// last write wins.
#[derive(Debug, Default)]
pub struct KeyCache {
    entries: RwLock<HashMap<(Algorithm, String), Arc<CachedKey>>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, algorithm: Algorithm, key_version: &str) -> Option<Arc<CachedKey>> {
        self.entries
            .read()
            .get(&(algorithm, key_version.to_owned()))
            .cloned()
    }

    pub fn put(
        &self,
        algorithm: Algorithm,
        key_version: impl Into<String>,
        key: VerificationKey,
    ) -> Arc<CachedKey> {
        let entry = Arc::new(CachedKey {
            key,
            fetched_at: SystemTime::now(),
        });
        self.entries
            .write()
            .insert((algorithm, key_version.into()), Arc::clone(&entry));
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
