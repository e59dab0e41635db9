// src/harvest/mod.rs
// =============================================================================
// This module runs external URL-harvesting tools.
//
// Tools like `gau` and `waybackurls` know URLs from archives and search
// engines that no amount of crawling would find. They are optional: the
// crawl works without them, and a tool that is missing or crashes simply
// contributes nothing.
//
// Contract for every tool:
// - invoked as `<program> [args...] <domain>`
// - prints one URL per line on stdout
// - exits with a non-zero code on failure
// =============================================================================

mod tool;

pub use tool::{harvest_all, Harvester};
