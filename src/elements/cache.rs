use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::elements::types::OrbitalElementSet;

struct CacheEntry {
    elements: OrbitalElementSet,
    fetched_at: Instant,
}

/// Element sets keyed by catalog number, expiring purely by elapsed time
pub struct ElementCache {
    ttl: Duration,
    entries: Mutex<HashMap<u32, CacheEntry>>,
}

impl ElementCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, catalog_number: u32) -> Option<OrbitalElementSet> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&catalog_number)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.elements.clone())
    }

    pub fn insert(&self, catalog_number: u32, elements: OrbitalElementSet) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            catalog_number,
            CacheEntry {
                elements,
                fetched_at: Instant::now(),
            },
        );
    }
}
