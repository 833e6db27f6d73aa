//! In-memory key-to-location index.
//!
//! The index maps 32-byte key digests to value locations in the data log. It
//! is rebuilt from the index log once at startup (see [`recovery`]) and from
//! then on mutated only by the map stage, while any number of reader threads
//! perform lookups concurrently.
//!
//! ## Thread safety
//!
//! Backed by a lock-free skip list (`crossbeam-skiplist`), which supports
//! many concurrent readers overlapping the single writer without locks or
//! torn reads. The index is never persisted itself; the index log is its
//! durable form.

pub mod record;
pub mod recovery;

pub use record::{IndexRecord, Location, RECORD_SIZE};

use crossbeam_skiplist::SkipMap;
use sha2::{Digest, Sha256};

/// A 32-byte key digest.
///
/// Keys are opaque byte strings; the engine only ever sees their SHA-256
/// digest. Hash collisions are treated as equal keys and are not detected.
pub type KeyHash = [u8; 32];

/// Hashes an opaque key into its fixed-size digest.
pub fn hash_key(key: &[u8]) -> KeyHash {
    let digest = Sha256::digest(key);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

/// Concurrent mapping from key digests to data-log locations.
pub struct Index {
    entries: SkipMap<KeyHash, Location>,
}

impl Index {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            entries: SkipMap::new(),
        }
    }

    /// Binds `hash` to `location`, replacing any previous binding.
    pub fn insert(&self, hash: KeyHash, location: Location) {
        self.entries.insert(hash, location);
    }

    /// Looks up the location bound to `hash`, if any.
    pub fn get(&self, hash: &KeyHash) -> Option<Location> {
        self.entries.get(hash).map(|entry| *entry.value())
    }

    /// Number of distinct keys in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}
