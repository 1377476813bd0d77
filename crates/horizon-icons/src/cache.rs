//! Rendered icon caching with LRU eviction.
//!
//! Every loader owns a [`PixmapCache`] keyed by a string that encodes all
//! parameters affecting the rendered result. Entries are weighted by their
//! pixel count and the least recently used entries are evicted once the
//! configured cost is exceeded.
//!
//! An entry whose `path` is `None` records that the icon could not be found;
//! the loader uses it as a negative cache.

use std::collections::HashMap;
use std::path::PathBuf;

use horizon_icons_render::Pixmap;

/// Default maximum cost: ten million pixels.
pub const DEFAULT_MAX_COST: usize = 10 * 1024 * 1024;

/// A rendered icon together with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPixmap {
    pub pixmap: Pixmap,
    /// `None` when the entry stands for an icon that was not found.
    pub path: Option<PathBuf>,
}

impl CachedPixmap {
    pub fn new(pixmap: Pixmap, path: Option<PathBuf>) -> Self {
        Self { pixmap, path }
    }

    /// Cost of the entry: one unit per pixel plus one.
    pub fn cost(&self) -> usize {
        self.pixmap.width() as usize * self.pixmap.height() as usize + 1
    }
}

/// Node in the LRU linked list.
#[derive(Debug)]
struct LruNode {
    prev: Option<String>,
    next: Option<String>,
}

/// A cost-bounded LRU cache of rendered icons.
///
/// This cache is NOT thread-safe; each loader owns its own instance.
pub struct PixmapCache {
    max_cost: usize,
    entries: HashMap<String, CachedPixmap>,
    /// LRU tracking: key -> node.
    lru_nodes: HashMap<String, LruNode>,
    /// Most recently used.
    lru_head: Option<String>,
    /// Least recently used.
    lru_tail: Option<String>,
    current_cost: usize,
    hits: u64,
    misses: u64,
}

impl PixmapCache {
    pub fn new(max_cost: usize) -> Self {
        Self {
            max_cost,
            entries: HashMap::new(),
            lru_nodes: HashMap::new(),
            lru_head: None,
            lru_tail: None,
            current_cost: 0,
            hits: 0,
            misses: 0,
        }
    }

    #[inline]
    pub fn cost(&self) -> usize {
        self.current_cost
    }

    #[inline]
    pub fn max_cost(&self) -> usize {
        self.max_cost
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Insert an entry, evicting least recently used entries to make room.
    ///
    /// An entry larger than the whole cache is not stored.
    pub fn insert(&mut self, key: impl Into<String>, entry: CachedPixmap) {
        let key = key.into();
        let cost = entry.cost();

        if self.entries.contains_key(&key) {
            self.remove(&key);
        }

        if cost > self.max_cost {
            tracing::trace!(target: "horizon_icons::cache", key = %key, cost, "Entry exceeds cache size");
            return;
        }

        while self.current_cost + cost > self.max_cost {
            let Some(tail) = self.lru_tail.clone() else {
                break;
            };
            tracing::trace!(target: "horizon_icons::cache", key = %tail, "Evicting");
            self.remove(&tail);
        }

        self.entries.insert(key.clone(), entry);
        self.current_cost += cost;
        self.lru_push_front(key);
    }

    /// Get an entry, marking it as most recently used.
    pub fn get(&mut self, key: &str) -> Option<&CachedPixmap> {
        if self.entries.contains_key(key) {
            self.hits += 1;
            self.lru_move_to_front(key);
            self.entries.get(key)
        } else {
            self.misses += 1;
            None
        }
    }

    /// Check if a key exists in the cache (without updating LRU order).
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<CachedPixmap> {
        let entry = self.entries.remove(key)?;
        self.current_cost -= entry.cost();
        self.lru_remove(key);
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru_nodes.clear();
        self.lru_head = None;
        self.lru_tail = None;
        self.current_cost = 0;
    }

    pub fn stats(&self) -> PixmapCacheStats {
        PixmapCacheStats {
            entries: self.entries.len(),
            cost: self.current_cost,
            max_cost: self.max_cost,
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate(),
        }
    }

    // ========================================================================
    // LRU LIST OPERATIONS
    // ========================================================================

    fn lru_push_front(&mut self, key: String) {
        let node = LruNode {
            prev: None,
            next: self.lru_head.clone(),
        };

        if let Some(old_head) = &self.lru_head
            && let Some(old_node) = self.lru_nodes.get_mut(old_head)
        {
            old_node.prev = Some(key.clone());
        }

        if self.lru_tail.is_none() {
            self.lru_tail = Some(key.clone());
        }

        self.lru_head = Some(key.clone());
        self.lru_nodes.insert(key, node);
    }

    fn lru_move_to_front(&mut self, key: &str) {
        if self.lru_head.as_deref() == Some(key) {
            return;
        }
        self.lru_remove(key);
        self.lru_push_front(key.to_string());
    }

    fn lru_remove(&mut self, key: &str) {
        let Some(node) = self.lru_nodes.remove(key) else {
            return;
        };

        match &node.prev {
            Some(prev_key) => {
                if let Some(prev_node) = self.lru_nodes.get_mut(prev_key) {
                    prev_node.next = node.next.clone();
                }
            }
            None => self.lru_head = node.next.clone(),
        }

        match &node.next {
            Some(next_key) => {
                if let Some(next_node) = self.lru_nodes.get_mut(next_key) {
                    next_node.prev = node.prev.clone();
                }
            }
            None => self.lru_tail = node.prev.clone(),
        }
    }
}

impl Default for PixmapCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COST)
    }
}

impl std::fmt::Debug for PixmapCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixmapCache")
            .field("entries", &self.entries.len())
            .field("cost", &self.current_cost)
            .field("max_cost", &self.max_cost)
            .field("hit_rate", &format!("{:.1}%", self.hit_rate() * 100.0))
            .finish()
    }
}

/// Statistics about a [`PixmapCache`].
#[derive(Debug, Clone)]
pub struct PixmapCacheStats {
    pub entries: usize,
    pub cost: usize,
    pub max_cost: usize,
    pub hits: u64,
    pub misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

impl PixmapCacheStats {
    /// Get the usage percentage (0.0 to 100.0).
    pub fn usage_percent(&self) -> f64 {
        if self.max_cost == 0 {
            0.0
        } else {
            (self.cost as f64 / self.max_cost as f64) * 100.0
        }
    }
}
