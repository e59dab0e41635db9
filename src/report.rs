// src/report.rs
// =============================================================================
// What a crawl hands back, and how it gets written out.
//
// - CrawlResult: the unique URLs found, plus a few counters
// - write_url_list: one URL per line, for piping into other tools
//
// #[derive(Serialize)] lets the CLI print the whole result as JSON.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// The outcome of one crawl
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlResult {
    /// Every unique URL that passed the domain and status checks, plus
    /// whatever the harvesters reported
    pub urls: BTreeSet<String>,
    pub summary: CrawlSummary,
}

impl CrawlResult {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_urls(self) -> Vec<String> {
        self.urls.into_iter().collect()
    }
}

/// Counters describing how much work a crawl did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Pages whose links were extracted
    pub pages_expanded: usize,
    /// Network requests made (page fetches and status checks)
    pub fetches_attempted: usize,
    /// Requests that got no HTTP answer at all
    pub fetches_failed: usize,
    /// Distinct URLs whose status was checked
    pub status_cache_entries: usize,
    /// URLs reported by external harvesters (before deduplication)
    pub harvested: usize,
}

/// Writes one URL per line, each terminated by a newline
pub fn write_url_list<'a, I>(path: &Path, urls: I) -> io::Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for url in urls {
        writeln!(writer, "{}", url)?;
    }
    writer.flush()
}
