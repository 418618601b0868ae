//! Bounded in-process tier

use std::collections::{HashMap, VecDeque};

use crate::types::CacheEntry;

/// Insertion-ordered map holding at most `capacity` entries.
///
/// Adding a new key when full evicts the oldest inserted key. Lookups do
/// not change the order.
#[derive(Debug)]
pub struct MemoryTier {
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
    capacity: usize,
}

impl MemoryTier {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Insert or replace an entry. Returns the evicted key, if any.
    ///
    /// Replacing an existing key moves it to the newest position.
    pub fn put(&mut self, key: &str, entry: CacheEntry) -> Option<String> {
        if self.capacity == 0 {
            return None;
        }

        if self.entries.insert(key.to_string(), entry).is_some() {
            self.order.retain(|k| k != key);
            self.order.push_back(key.to_string());
            return None;
        }

        self.order.push_back(key.to_string());

        if self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                return Some(oldest);
            }
        }
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Keys from oldest to newest
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
