//! Bounded least-recently-used cache.
//!
//! Recency is tracked with a monotonically increasing access tick per
//! entry plus an ordered index from tick to key, so promotion and eviction
//! are both `O(log n)`. Single-threaded use only.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Default number of entries kept by selector caches.
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    tick: u64,
}

/// Fixed-capacity cache that evicts the least recently used entry.
///
/// # Examples
///
/// ```
/// use formwizard::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.get(&"a");
/// cache.set("c", 3);
///
/// assert!(cache.has(&"a"));
/// assert!(!cache.has(&"b"));
/// ```
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    clock: u64,
}

impl<K, V> Default for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            clock: 0,
        }
    }

    /// Returns the value for `key`, promoting it to most recently used.
    ///
    /// A miss has no side effect.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = self.entries.get_mut(key)?;
        self.clock += 1;
        self.order.remove(&slot.tick);
        slot.tick = self.clock;
        self.order.insert(self.clock, key.clone());
        Some(&slot.value)
    }

    /// Inserts or updates `key`, making it the most recently used entry.
    ///
    /// Inserting a new key into a full cache first evicts the single least
    /// recently used entry.
    pub fn set(&mut self, key: K, value: V) {
        self.clock += 1;
        let tick = self.clock;

        if let Some(slot) = self.entries.get_mut(&key) {
            self.order.remove(&slot.tick);
            slot.tick = tick;
            slot.value = value;
            self.order.insert(tick, key);
            return;
        }

        if self.entries.len() >= self.capacity {
            if let Some((_, oldest)) = self.order.pop_first() {
                self.entries.remove(&oldest);
            }
        }

        self.order.insert(tick, key.clone());
        self.entries.insert(key, Slot { value, tick });
    }

    /// Returns true if `key` is cached. Does not affect recency.
    #[must_use]
    pub fn has(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
