// src/crawl/status.rs
// =============================================================================
// Remembers the HTTP status of every URL checked during one crawl.
//
// The same link usually shows up on many pages (navigation bars, footers).
// Checking it once is enough: after the first answer every later lookup
// is served from memory.
//
// Two details matter here:
// - The cache belongs to one crawl. Two crawls running side by side each
//   get their own, so one can't see stale answers from the other.
// - If two branches ask for the same URL at the same moment, only one
//   request goes out. The second branch waits for the first one's answer.
//
// A failed request is remembered as a failure. We never retry a URL within
// the same crawl.
//
// Rust concepts:
// - tokio::sync::OnceCell: a slot filled exactly once, even under races
// - Generic closures: the fetch logic is passed in, which keeps the cache
//   testable without a network
// =============================================================================

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use crate::error::FetchError;

/// What we learned about a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    /// The server answered with this status code
    Status(u16),
    /// The request never got an answer
    Failed(FetchError),
}

impl StatusOutcome {
    pub fn is_status(&self, expected: u16) -> bool {
        matches!(self, StatusOutcome::Status(code) if *code == expected)
    }
}

type Slot = Arc<OnceCell<StatusOutcome>>;

#[derive(Default)]
pub struct StatusCache {
    entries: Mutex<HashMap<String, Slot>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached outcome for `url`, running `fetch` on a miss
    ///
    /// `fetch` runs at most once per URL for the lifetime of the cache.
    /// Concurrent callers for the same URL share that single run.
    pub async fn get_or_fetch<F, Fut>(&self, url: &str, fetch: F) -> StatusOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StatusOutcome>,
    {
        // Grab (or create) the slot while holding the lock, then release the
        // lock before awaiting so other URLs aren't blocked
        let slot = {
            let mut entries = self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            entries.entry(url.to_string()).or_default().clone()
        };

        slot.get_or_init(fetch).await.clone()
    }

    /// Returns `Some(url)` if the URL answers with `expected`, None otherwise
    pub async fn check<F, Fut>(&self, url: &str, expected: u16, fetch: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StatusOutcome>,
    {
        let outcome = self.get_or_fetch(url, fetch).await;
        outcome.is_status(expected).then(|| url.to_string())
    }

    /// Looks at the cache without fetching anything
    pub fn get(&self, url: &str) -> Option<StatusOutcome> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(url).and_then(|slot| slot.get().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
