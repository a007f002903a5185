use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use crate::batch::request::RequestKey;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{MockupError, MockupResult};
use crate::store::template::TemplateId;

/// One composed mockup, PNG-encoded.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositionResult {
    pub template_id: TemplateId,
    pub image_png: Arc<Vec<u8>>,
    pub size: PixelSize,
    pub generated_at: SystemTime,
    pub key: RequestKey,
}

/// Counters since the cache was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub entries: usize,
    pub bytes: usize,
}

/// Bounded LRU of composed results, keyed by request hash.
///
/// Slots are write-once: inserting a key that is already present keeps the first result.
#[derive(Debug)]
pub struct CompositionCache {
    max_entries: usize,
    max_bytes: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<RequestKey, Arc<CompositionResult>>,
    lru: VecDeque<RequestKey>,
    by_template: HashMap<TemplateId, HashSet<RequestKey>>,
    bytes: usize,
    stats: CacheStats,
}

impl CompositionCache {
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            max_bytes: max_bytes.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Cached result for `key`, or [`MockupError::CacheMiss`].
    pub fn get(&self, key: &RequestKey) -> MockupResult<Arc<CompositionResult>> {
        let mut inner = self.lock()?;
        match inner.map.get(key).cloned() {
            Some(hit) => {
                inner.stats.hits += 1;
                inner.touch(*key);
                Ok(hit)
            }
            None => {
                inner.stats.misses += 1;
                Err(MockupError::CacheMiss)
            }
        }
    }

    /// Store `result` unless its key is already cached; returns the cached value either way.
    ///
    /// Results larger than the whole byte budget are returned without being cached.
    pub fn insert(&self, result: CompositionResult) -> MockupResult<Arc<CompositionResult>> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner.map.get(&result.key).cloned() {
            inner.touch(result.key);
            return Ok(existing);
        }
        let result = Arc::new(result);
        let size = result.image_png.len();
        if size > self.max_bytes {
            tracing::debug!(key = %result.key, size, "result exceeds cache budget; not cached");
            return Ok(result);
        }

        inner.bytes += size;
        inner.map.insert(result.key, result.clone());
        inner.lru.push_back(result.key);
        inner
            .by_template
            .entry(result.template_id.clone())
            .or_default()
            .insert(result.key);
        inner.stats.inserts += 1;

        while inner.map.len() > self.max_entries || inner.bytes > self.max_bytes {
            let Some(old) = inner.lru.pop_front() else {
                break;
            };
            if inner.remove(&old) {
                inner.stats.evictions += 1;
                tracing::debug!(key = %old, "evicted cached composition");
            }
        }
        Ok(result)
    }

    /// Drop every result composed from `template`; returns how many were removed.
    pub fn invalidate_template(&self, template: &TemplateId) -> MockupResult<usize> {
        let mut inner = self.lock()?;
        let keys = inner.by_template.remove(template).unwrap_or_default();
        let mut removed = 0;
        for key in keys {
            if inner.remove(&key) {
                inner.lru.retain(|k| *k != key);
                removed += 1;
            }
        }
        inner.stats.invalidations += removed as u64;
        if removed > 0 {
            tracing::info!(template = %template, removed, "invalidated cached compositions");
        }
        Ok(removed)
    }

    pub fn clear(&self) -> MockupResult<()> {
        let mut inner = self.lock()?;
        let stats = inner.stats;
        *inner = CacheInner {
            stats,
            ..CacheInner::default()
        };
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|i| i.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock()
            .map(|i| CacheStats {
                entries: i.map.len(),
                bytes: i.bytes,
                ..i.stats
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> MockupResult<MutexGuard<'_, CacheInner>> {
        self.inner
            .lock()
            .map_err(|_| MockupError::Other(anyhow::anyhow!("composition cache lock poisoned")))
    }
}

impl CacheInner {
    fn touch(&mut self, key: RequestKey) {
        if let Some(pos) = self.lru.iter().position(|k| *k == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }

    /// Remove `key` from the map and template index; the LRU queue is left to the caller.
    fn remove(&mut self, key: &RequestKey) -> bool {
        let Some(old) = self.map.remove(key) else {
            return false;
        };
        self.bytes = self.bytes.saturating_sub(old.image_png.len());
        if let Some(set) = self.by_template.get_mut(&old.template_id) {
            set.remove(key);
            if set.is_empty() {
                self.by_template.remove(&old.template_id);
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/cache.rs"]
mod tests;
