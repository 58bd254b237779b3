//! In-memory list cache keyed by corporation

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::config::ReportSettings;
use crate::traits::ListCache;

/// Cache entries expire once older than the staleness threshold
#[derive(Debug)]
pub struct MemoryListCache<T> {
    entries: RwLock<HashMap<String, (DateTime<Utc>, T)>>,
    staleness: Duration,
}

impl<T: Clone> MemoryListCache<T> {
    pub fn new(staleness: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            staleness,
        }
    }

    pub fn from_settings(settings: &ReportSettings) -> Self {
        Self::new(settings.cache_staleness())
    }

    fn is_fresh(&self, stored_at: DateTime<Utc>) -> bool {
        Utc::now() - stored_at < self.staleness
    }
}

impl<T: Clone + Send + Sync> ListCache<T> for MemoryListCache<T> {
    fn get(&self, corporation_uuid: &str) -> Option<T> {
        let entries = self.entries.read().ok()?;
        match entries.get(corporation_uuid) {
            Some((stored_at, value)) if self.is_fresh(*stored_at) => Some(value.clone()),
            Some(_) => {
                debug!(corporation_uuid, "cached list is stale");
                None
            }
            None => None,
        }
    }

    fn set(&self, corporation_uuid: &str, value: T) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(corporation_uuid.to_string(), (Utc::now(), value));
        }
    }

    fn invalidate(&self, corporation_uuid: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(corporation_uuid);
        }
    }
}
