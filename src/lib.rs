// src/lib.rs
// =============================================================================
// link-scout: find every link on a site that answers with a given status.
//
// Starting from one or more seed URLs, the crawler follows links up to a
// fixed depth, stays on one domain (optionally including subdomains), and
// keeps only links whose HTTP status matches what you asked for. External
// tools like gau and waybackurls can add URLs from web archives.
//
// Quick start:
//
//     let links = link_scout::crawl_website(
//         vec!["https://example.com".to_string()],
//         "example.com",
//         false, // include subdomains
//         200,   // expected status
//         2,     // depth
//         10,    // concurrent fetches
//         false, // gau
//         false, // waybackurls
//         20,    // timeout in seconds
//     )
//     .await;
//
// For more control (partial results on failure, output files, custom
// harvesters) build a CrawlRequest and run a CrawlSession.
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod harvest;
pub mod report;

pub use config::CrawlRequest;
pub use crawl::{crawl_website, CrawlSession};
pub use error::{CrawlError, CrawlFailure, FetchError, HarvestError};
pub use harvest::Harvester;
pub use report::{CrawlResult, CrawlSummary};
