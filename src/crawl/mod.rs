// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Submodules, from the bottom up:
// - visited: bounded set of URLs already claimed by some branch
// - status: per-crawl cache of HTTP status codes
// - extract: fetches a page and pulls candidate links out of it
// - engine: the recursive, depth-limited, concurrency-limited walk
// - session: runs harvesters and one walk per seed, merges the results
//
// Rust concepts:
// - Modules: Organize code into namespaces
// - pub use: Re-export items so callers write crawl::CrawlSession
// =============================================================================

mod engine;
mod extract;
mod session;
mod status;
mod visited;

pub use engine::{CrawlEngine, CrawlStats, DomainScope};
pub use extract::{extract_links, LinkExtractor};
pub use session::{build_client, crawl_website, CrawlSession};
pub use status::{StatusCache, StatusOutcome};
pub use visited::VisitedSet;
