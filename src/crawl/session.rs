// src/crawl/session.rs
// =============================================================================
// Top-level orchestration of one crawl.
//
// A session:
// 1. Validates the request and builds one HTTP client for everything
// 2. Starts the external harvesters and one traversal per seed, all at
//    the same time (they don't depend on each other)
// 3. Puts everything they found into one set
// 4. Optionally writes the set to a file
//
// Per-URL and per-tool failures are handled further down and never reach
// this level. What does reach it is fatal: an invalid request, a client
// that can't be built, a crawl where almost every request failed, or an
// output file that can't be written. In that case `run` returns the error
// together with the partial results, and the caller decides what to do.
// =============================================================================

use futures::future::join_all;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

use crate::config::{CrawlRequest, DEFAULT_TIMEOUT_SECS};
use crate::crawl::engine::CrawlEngine;
use crate::error::{CrawlError, CrawlFailure};
use crate::harvest::{harvest_all, Harvester};
use crate::report::{write_url_list, CrawlResult};

// How many redirects to follow when --follow-redirects is on
const MAX_REDIRECTS: usize = 10;

pub struct CrawlSession {
    request: CrawlRequest,
}

impl CrawlSession {
    pub fn new(request: CrawlRequest) -> Self {
        Self { request }
    }

    /// Runs the crawl to completion
    pub async fn run(&self) -> Result<CrawlResult, CrawlFailure> {
        let request = &self.request;
        request.validate()?;

        let client = build_client(request).map_err(CrawlError::Client)?;
        let engine = CrawlEngine::new(client, request);

        info!(
            domain = %request.domain,
            seeds = request.seeds.len(),
            depth = request.depth,
            concurrency = request.concurrency,
            harvesters = request.harvesters.len(),
            "starting crawl"
        );

        let harvest = harvest_all(&request.harvesters, &request.domain);
        let traversals = join_all(
            request
                .seeds
                .iter()
                .map(|seed| engine.crawl(seed.clone(), request.depth)),
        );
        let (harvested, crawled) = tokio::join!(harvest, traversals);

        let mut result = CrawlResult {
            summary: engine.summary(),
            ..CrawlResult::default()
        };
        result.summary.harvested = harvested.len();
        result.urls.extend(harvested);
        result.urls.extend(crawled.into_iter().flatten());

        if let Some(error) = engine.failure() {
            return Err(CrawlFailure {
                error,
                partial: result,
            });
        }

        if let Some(path) = &request.output {
            if let Err(source) = write_url_list(path, &result.urls) {
                return Err(CrawlFailure {
                    error: CrawlError::Output {
                        path: path.clone(),
                        source,
                    },
                    partial: result,
                });
            }
            info!(path = %path.display(), "wrote results");
        }

        info!(
            urls = result.len(),
            pages = result.summary.pages_expanded,
            fetches = result.summary.fetches_attempted,
            failed = result.summary.fetches_failed,
            "crawl finished"
        );

        Ok(result)
    }
}

/// Builds the HTTP client shared by every request of a crawl
///
/// Certificate verification is disabled, so self-signed staging hosts are
/// crawled like any other site.
pub fn build_client(request: &CrawlRequest) -> Result<Client, reqwest::Error> {
    let redirect = if request.follow_redirects {
        Policy::limited(MAX_REDIRECTS)
    } else {
        Policy::none()
    };

    Client::builder()
        .danger_accept_invalid_certs(true)
        .user_agent(request.user_agent.as_str())
        .timeout(request.timeout)
        .redirect(redirect)
        .build()
}

/// Crawls from `seed_urls` and returns the unique URLs found
///
/// This is the simple all-or-nothing entry point: on a fatal error the
/// error is logged and an empty list comes back. Use `CrawlSession` to get
/// the error and the partial results instead.
///
/// A `timeout_seconds` of 0 means the default of 20 seconds.
#[allow(clippy::too_many_arguments)]
pub async fn crawl_website(
    seed_urls: Vec<String>,
    domain: &str,
    include_subdomains: bool,
    expected_status: u16,
    depth: u32,
    concurrency_limit: usize,
    use_gau: bool,
    use_waybackurls: bool,
    timeout_seconds: u64,
) -> Vec<String> {
    let mut request = CrawlRequest::new(seed_urls, domain);
    request.include_subdomains = include_subdomains;
    request.expected_status = expected_status;
    request.depth = depth;
    request.concurrency = concurrency_limit;
    request.timeout = Duration::from_secs(if timeout_seconds == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        timeout_seconds
    });
    if use_gau {
        request.harvesters.push(Harvester::gau());
    }
    if use_waybackurls {
        request.harvesters.push(Harvester::waybackurls());
    }

    match CrawlSession::new(request).run().await {
        Ok(result) => result.into_urls(),
        Err(failure) => {
            error!("crawl failed: {}", failure.error);
            Vec::new()
        }
    }
}
