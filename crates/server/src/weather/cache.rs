use log::trace;
use parking_lot::Mutex;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

use super::WeatherReading;

pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    data: WeatherReading,
    expiry: OffsetDateTime,
}

/// Expiring store of weather readings keyed by coordinate key.
///
/// Expiry is checked lazily: a read past an entry's expiry evicts it and reports a miss.
/// Entries nobody reads again stay until the cache fills up or [`WeatherCache::purge_expired`]
/// runs; the server calls it periodically. Every operation runs under one lock, so callers
/// never observe a half-applied update.
#[derive(Debug)]
pub struct WeatherCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
}

impl Default for WeatherCache {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &str) -> Option<WeatherReading> {
        self.get_at(key, OffsetDateTime::now_utc())
    }

    pub fn set(&self, key: &str, data: WeatherReading, ttl: Duration) {
        self.set_at(key, data, ttl, OffsetDateTime::now_utc())
    }

    pub fn get_at(&self, key: &str, now: OffsetDateTime) -> Option<WeatherReading> {
        let mut entries = self.entries.lock();
        let entry = *entries.get(key)?;
        if now > entry.expiry {
            trace!("weather cache entry expired: {}", key);
            entries.remove(key);
            return None;
        }
        Some(entry.data)
    }

    pub fn set_at(&self, key: &str, data: WeatherReading, ttl: Duration, now: OffsetDateTime) {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) && entries.len() >= self.capacity {
            entries.retain(|_, entry| now <= entry.expiry);
            if entries.len() >= self.capacity {
                let soonest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expiry)
                    .map(|(k, _)| k.clone());
                if let Some(soonest) = soonest {
                    trace!("weather cache full, evicting: {}", soonest);
                    entries.remove(&soonest);
                }
            }
        }
        entries.insert(
            key.to_owned(),
            CacheEntry {
                data,
                expiry: now + ttl,
            },
        );
    }

    /// Drop every entry whose expiry has passed, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.expiry);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
