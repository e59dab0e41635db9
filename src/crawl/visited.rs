// src/crawl/visited.rs
// =============================================================================
// A bounded "already seen" set shared by every branch of one crawl.
//
// Big sites can have millions of URLs, so the set has a fixed capacity.
// When it is full, the URL that was inserted longest ago is forgotten
// (first in, first out). Touching a URL again moves it to the back of the
// line without growing the set.
//
// Many crawl branches run at the same time and all of them read and write
// this set, so it sits behind a Mutex. The lock is only held for a quick
// map operation, never while waiting on the network.
//
// Rust concepts:
// - Mutex: mutual exclusion, so only one branch changes the set at a time
// - IndexSet: a HashSet that remembers insertion order
// =============================================================================

use indexmap::IndexSet;
use std::sync::{Mutex, MutexGuard};

pub struct VisitedSet {
    urls: Mutex<IndexSet<String>>,
    capacity: usize,
}

impl VisitedSet {
    pub fn new(capacity: usize) -> Self {
        // A zero capacity would make every insert evict itself
        let capacity = capacity.max(1);
        Self {
            urls: Mutex::new(IndexSet::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Marks a URL as visited, evicting the oldest entry if the set is full
    pub fn add(&self, url: &str) {
        let mut urls = self.lock();
        Self::insert(&mut urls, url, self.capacity);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    /// Check-and-insert in one step
    ///
    /// Returns true if this caller is the first to claim the URL. Two racing
    /// branches can never both get true for the same URL.
    pub fn claim(&self, url: &str) -> bool {
        let mut urls = self.lock();
        if urls.contains(url) {
            return false;
        }
        Self::insert(&mut urls, url, self.capacity);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn insert(urls: &mut IndexSet<String>, url: &str, capacity: usize) {
        // Removing first means the insert below lands in the newest slot
        let already_present = urls.shift_remove(url);
        if !already_present && urls.len() >= capacity {
            urls.shift_remove_index(0);
        }
        urls.insert(url.to_string());
    }

    // A panic in another branch poisons the lock, but the set itself is
    // still consistent (every operation leaves it valid), so keep going.
    fn lock(&self) -> MutexGuard<'_, IndexSet<String>> {
        self.urls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why &self and not &mut self?
//    - The set is shared by many async branches at once
//    - &mut self would require exclusive access, which they can't all have
//    - The Mutex gives us "interior mutability": changing data behind &self
//
// 2. Why shift_remove instead of swap_remove?
//    - swap_remove is faster but moves the last element into the hole,
//      scrambling the insertion order
//    - shift_remove keeps the order intact, which eviction relies on
//
// 3. Why claim() in addition to contains() + add()?
//    - Between a contains() and an add() another branch might sneak in
//    - claim() does both while holding the lock once
// -----------------------------------------------------------------------------
