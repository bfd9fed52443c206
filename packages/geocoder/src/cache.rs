//! In-memory memoization of reverse geocoding results.
//!
//! Keys are coordinates rounded to a fixed number of decimal places, so
//! reports a few metres apart share one lookup. Both hits and misses
//! (no locality) are cached; errors are not, so a transient failure is
//! retried on the next request.
//!
//! The cache holds at most `capacity` coordinates. Once full, the least
//! recently used entry is evicted to make room. [`CachingGeocoder::clear`]
//! drops everything, e.g. after expired diagnoses are purged.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{GeocodeError, ReverseGeocoder};

/// Rounded `(latitude, longitude)` key.
type CacheKey = (i64, i64);

/// Cached cities plus a recency index for LRU eviction.
#[derive(Default)]
struct Entries {
    cities: BTreeMap<CacheKey, (Option<String>, u64)>,
    /// Last-use tick -> key; the first entry is the eviction candidate.
    recency: BTreeMap<u64, CacheKey>,
    tick: u64,
}

impl Entries {
    fn get(&mut self, key: CacheKey) -> Option<Option<String>> {
        self.tick += 1;
        let tick = self.tick;
        let (city, used) = self.cities.get_mut(&key)?;
        self.recency.remove(&*used);
        *used = tick;
        self.recency.insert(tick, key);
        Some(city.clone())
    }

    fn insert(&mut self, key: CacheKey, city: Option<String>, capacity: usize) {
        if capacity == 0 {
            return;
        }

        self.tick += 1;
        if let Some((_, used)) = self.cities.insert(key, (city, self.tick)) {
            self.recency.remove(&used);
        }
        self.recency.insert(self.tick, key);

        while self.cities.len() > capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.cities.remove(&oldest);
        }
    }
}

/// Wraps a [`ReverseGeocoder`] with a bounded memoizing cache.
pub struct CachingGeocoder<G> {
    inner: G,
    scale: f64,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl<G: ReverseGeocoder> CachingGeocoder<G> {
    /// Caches up to `capacity` lookups from `inner`, rounding coordinates to
    /// `precision` decimal places. A capacity of 0 disables caching.
    #[must_use]
    pub fn new(inner: G, precision: u8, capacity: usize) -> Self {
        Self {
            inner,
            scale: 10f64.powi(i32::from(precision)),
            capacity,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Number of cached coordinates.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.cities.len()
    }

    /// Whether nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.cities.is_empty()
    }

    /// Drops every cached lookup.
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        let dropped = entries.cities.len();
        *entries = Entries::default();
        log::debug!("Cleared {dropped} cached geocode lookups");
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, latitude: f64, longitude: f64) -> CacheKey {
        (
            (latitude * self.scale).round() as i64,
            (longitude * self.scale).round() as i64,
        )
    }
}

#[async_trait]
impl<G: ReverseGeocoder> ReverseGeocoder for CachingGeocoder<G> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn concurrency_limit(&self) -> Option<usize> {
        self.inner.concurrency_limit()
    }

    async fn resolve_city(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        let key = self.key(latitude, longitude);

        if let Some(cached) = self.entries.lock().await.get(key) {
            return Ok(cached);
        }

        // The lock is not held across the lookup so concurrent misses for
        // different coordinates proceed in parallel.
        let resolved = self.inner.resolve_city(latitude, longitude).await?;
        self.entries
            .lock()
            .await
            .insert(key, resolved.clone(), self.capacity);
        Ok(resolved)
    }
}
