// src/crawl/engine.rs
// =============================================================================
// The recursive crawl.
//
// For one URL at a given depth:
// 1. Stop if depth is used up, or if another branch already claimed the URL
// 2. Claim the URL in the visited set (before any work, so racing branches
//    can't both expand it)
// 3. Fetch the page and extract its links (holding one limiter permit)
// 4. Keep only links on the target domain
// 5. Check the status of those links, all at once, through the cache
// 6. If depth allows, crawl every accepted link one level deeper
// 7. Return accepted links plus everything the children found
//
// The domain filter runs BEFORE the status check, so we never spend a
// request on a host we were going to throw away anyway.
//
// Every network request of the crawl (page fetches and status checks) goes
// through one Semaphore. A branch gives its permit back as soon as its own
// fetch is done, before its children start, so even a limit of 1 can't
// deadlock.
//
// Failures at one URL are logged and contribute nothing. They never stop
// sibling branches. If nearly every request fails, though, something is
// wrong with the setup and the engine "trips": no new pages are expanded
// and the session reports an error.
//
// Rust concepts:
// - BoxFuture: an async fn can't call itself directly (its future type
//   would be infinitely large), so the recursive call returns a boxed future
// - join_all: run many futures concurrently and wait for all of them
// - Atomics: counters shared by every branch without a lock
// =============================================================================

use futures::future::{join_all, BoxFuture, FutureExt};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use crate::config::{normalize_domain, CrawlRequest, FailureThreshold};
use crate::crawl::extract::LinkExtractor;
use crate::crawl::status::{StatusCache, StatusOutcome};
use crate::crawl::visited::VisitedSet;
use crate::error::{CrawlError, FetchError};
use crate::report::CrawlSummary;

/// Which hosts belong to the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    domain: String,
    include_subdomains: bool,
}

impl DomainScope {
    pub fn new(domain: &str, include_subdomains: bool) -> Self {
        Self {
            domain: normalize_domain(domain),
            include_subdomains,
        }
    }

    /// Returns true if the URL's host is the domain (or a subdomain of it,
    /// when subdomains are included)
    ///
    /// Subdomain matching respects label boundaries: "api.example.com" is
    /// inside "example.com", "badexample.com" is not.
    pub fn contains(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };

        if host == self.domain {
            return true;
        }

        // Suffix must start at a label, so "badexample.com" stays out
        self.include_subdomains
            && host
                .strip_suffix(self.domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// Counters shared by every branch of one crawl
#[derive(Debug, Default)]
pub struct CrawlStats {
    attempted: AtomicUsize,
    failed: AtomicUsize,
    expanded: AtomicUsize,
}

impl CrawlStats {
    fn record_fetch(&self, failed: bool) -> (usize, usize) {
        let attempted = self.attempted.fetch_add(1, Ordering::SeqCst) + 1;
        let failed = if failed {
            self.failed.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.failed.load(Ordering::SeqCst)
        };
        (failed, attempted)
    }

    pub fn attempted(&self) -> usize {
        self.attempted.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn expanded(&self) -> usize {
        self.expanded.load(Ordering::SeqCst)
    }
}

/// Shared state and settings for one crawl
///
/// Create one engine per crawl and call `crawl` once per seed. All seeds
/// then share the same visited set, status cache and limiter.
pub struct CrawlEngine {
    client: Client,
    extractor: LinkExtractor,
    scope: DomainScope,
    expected_status: u16,
    limiter: Semaphore,
    visited: VisitedSet,
    statuses: StatusCache,
    stats: CrawlStats,
    threshold: FailureThreshold,
    tripped: AtomicBool,
}

impl CrawlEngine {
    pub fn new(client: Client, request: &CrawlRequest) -> Self {
        Self {
            extractor: LinkExtractor::new(client.clone()),
            client,
            scope: DomainScope::new(&request.domain, request.include_subdomains),
            expected_status: request.expected_status,
            limiter: Semaphore::new(request.concurrency.max(1)),
            visited: VisitedSet::new(request.visited_capacity),
            statuses: StatusCache::new(),
            stats: CrawlStats::default(),
            threshold: request.failure_threshold,
            tripped: AtomicBool::new(false),
        }
    }

    /// Crawls `url` up to `depth` link hops and returns accepted links
    ///
    /// The result may contain duplicates across branches; callers put it
    /// into a set.
    pub fn crawl<'a>(&'a self, url: String, depth: u32) -> BoxFuture<'a, Vec<String>> {
        async move {
            if depth < 1 || self.is_tripped() {
                return Vec::new();
            }
            if !self.visited.claim(&url) {
                debug!(%url, "already visited");
                return Vec::new();
            }
            self.stats.expanded.fetch_add(1, Ordering::SeqCst);
            debug!(%url, depth, "expanding");

            let candidates = match self.fetch_links(&url).await {
                Ok(links) => links,
                Err(e) => {
                    warn!(%url, "failed to extract links: {}", e);
                    return Vec::new();
                }
            };

            let in_scope: Vec<String> = candidates
                .into_iter()
                .filter(|link| self.scope.contains(link))
                .collect();

            let checks = in_scope.iter().map(|link| self.check_status(link));
            let mut accepted: Vec<String> = join_all(checks).await.into_iter().flatten().collect();
            debug!(%url, candidates = in_scope.len(), accepted = accepted.len(), "status checks done");

            if depth > 1 {
                let children = accepted
                    .iter()
                    .map(|link| self.crawl(link.clone(), depth - 1));
                let nested = join_all(children).await;
                accepted.extend(nested.into_iter().flatten());
            }

            accepted
        }
        .boxed()
    }

    /// The fatal error for this crawl, if the failure rate tripped it
    pub fn failure(&self) -> Option<CrawlError> {
        self.is_tripped().then(|| CrawlError::FailureRateExceeded {
            failed: self.stats.failed(),
            attempted: self.stats.attempted(),
        })
    }

    pub fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            pages_expanded: self.stats.expanded(),
            fetches_attempted: self.stats.attempted(),
            fetches_failed: self.stats.failed(),
            status_cache_entries: self.statuses.len(),
            harvested: 0,
        }
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn statuses(&self) -> &StatusCache {
        &self.statuses
    }

    // Page fetch, holding one limiter permit until the body is parsed
    async fn fetch_links(&self, url: &str) -> Result<Vec<String>, FetchError> {
        // The limiter is never closed, so acquire() can't fail
        let _permit = self.limiter.acquire().await.ok();
        let result = self.extractor.extract(url).await;
        self.record_fetch(result.is_err());
        result
    }

    async fn check_status(&self, link: &str) -> Option<String> {
        self.statuses
            .check(link, self.expected_status, || self.fetch_status(link))
            .await
    }

    // Only runs on a cache miss
    async fn fetch_status(&self, link: &str) -> StatusOutcome {
        let _permit = self.limiter.acquire().await.ok();

        let outcome = match self.client.get(link).send().await {
            Ok(response) => StatusOutcome::Status(response.status().as_u16()),
            Err(e) => {
                let error = FetchError::from(e);
                warn!(url = %link, "status check failed: {}", error);
                StatusOutcome::Failed(error)
            }
        };

        self.record_fetch(matches!(outcome, StatusOutcome::Failed(_)));
        outcome
    }

    fn record_fetch(&self, failed: bool) {
        let (failed, attempted) = self.stats.record_fetch(failed);
        if self.threshold.is_exceeded(failed, attempted)
            && !self.tripped.swap(true, Ordering::SeqCst)
        {
            warn!(failed, attempted, "failure rate too high, stopping the crawl");
        }
    }

    fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_string(body)
    }

    fn engine_for(server: &MockServer, configure: impl FnOnce(&mut CrawlRequest)) -> CrawlEngine {
        let mut request = CrawlRequest::new([server.uri()], "127.0.0.1");
        request.timeout = Duration::from_secs(2);
        configure(&mut request);
        CrawlEngine::new(Client::new(), &request)
    }

    #[test]
    fn test_scope_exact_host() {
        let scope = DomainScope::new("example.com", false);
        assert!(scope.contains("https://example.com/a"));
        assert!(scope.contains("http://example.com:8080/a"));
        assert!(!scope.contains("https://api.example.com/a"));
        assert!(!scope.contains("https://other.com/a"));
        assert!(!scope.contains("not a url"));
    }

    #[test]
    fn test_scope_with_subdomains() {
        let scope = DomainScope::new("example.com", true);
        assert!(scope.contains("https://example.com/a"));
        assert!(scope.contains("https://api.example.com/a"));
        assert!(scope.contains("https://deep.api.example.com/a"));
        assert!(!scope.contains("https://badexample.com/a"));
        assert!(!scope.contains("https://example.com.evil.net/a"));
    }

    #[test]
    fn test_scope_is_case_insensitive() {
        let scope = DomainScope::new("Example.COM", false);
        assert!(scope.contains("https://EXAMPLE.com/a"));
    }

    #[tokio::test]
    async fn test_depth_zero_does_nothing() {
        let server = MockServer::start().await;
        let engine = engine_for(&server, |_| {});

        let links = engine.crawl(server.uri(), 0).await;
        assert!(links.is_empty());
        assert!(engine.visited().is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_scope_links_are_never_fetched() {
        let site = MockServer::start().await;
        let elsewhere = MockServer::start().await;

        // "localhost" is a different host than "127.0.0.1" even though it
        // reaches the same machine
        let foreign = elsewhere.uri().replace("127.0.0.1", "localhost");
        let body = format!(
            r#"<a href="/a">A</a> <a href="{}/b">B</a>"#,
            foreign
        );
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(page(&body))
            .mount(&site)
            .await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(page("a"))
            .mount(&site)
            .await;
        Mock::given(method("GET"))
            .respond_with(page("b"))
            .expect(0)
            .mount(&elsewhere)
            .await;

        let engine = engine_for(&site, |_| {});
        let links = engine.crawl(format!("{}/", site.uri()), 1).await;

        assert_eq!(links, vec![format!("{}/a", site.uri())]);
        assert!(elsewhere.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_depth_bounds_the_walk() {
        let server = MockServer::start().await;
        for (route, next) in [("/", "/one"), ("/one", "/two"), ("/two", "/three"), ("/three", "/four")] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(page(&format!(r#"<a href="{}">next</a>"#, next)))
                .mount(&server)
                .await;
        }

        let engine = engine_for(&server, |_| {});
        let mut links = engine.crawl(format!("{}/", server.uri()), 2).await;
        links.sort();

        assert_eq!(
            links,
            vec![format!("{}/one", server.uri()), format!("{}/two", server.uri())]
        );
    }

    #[tokio::test]
    async fn test_status_is_checked_once_per_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(page(r#"<a href="/same">1</a><a href="/same">2</a><img src="/same">"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/same"))
            .respond_with(page("same"))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_for(&server, |_| {});
        let links = engine.crawl(format!("{}/", server.uri()), 1).await;

        assert_eq!(links.len(), 3);
        assert_eq!(engine.statuses().len(), 1);
    }

    #[tokio::test]
    async fn test_limit_of_one_still_finishes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(page(r#"<a href="/a">A</a><a href="/b">B</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(page(r#"<a href="/b">B</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(page(r#"<a href="/a">A</a>"#))
            .mount(&server)
            .await;

        let engine = engine_for(&server, |request| request.concurrency = 1);
        let mut links = engine.crawl(format!("{}/", server.uri()), 3).await;
        links.sort();
        links.dedup();

        assert_eq!(
            links,
            vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())]
        );
    }

    #[tokio::test]
    async fn test_limit_caps_simultaneous_fetches() {
        const DELAY: Duration = Duration::from_millis(300);

        let server = MockServer::start().await;
        let routes = ["/s0", "/s1", "/s2", "/s3"];
        let body: String = routes
            .iter()
            .map(|route| format!(r#"<a href="{}">x</a>"#, route))
            .collect();
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(page(&body))
            .mount(&server)
            .await;
        for route in routes {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(page("slow").set_delay(DELAY))
                .mount(&server)
                .await;
        }

        let root = format!("{}/", server.uri());

        // One permit: the four slow checks queue up behind each other
        let serial = engine_for(&server, |request| request.concurrency = 1);
        let started = std::time::Instant::now();
        let links = serial.crawl(root.clone(), 1).await;
        let serial_elapsed = started.elapsed();
        assert_eq!(links.len(), 4);
        assert!(
            serial_elapsed >= DELAY * 4,
            "limit 1 finished in {:?}",
            serial_elapsed
        );

        // Four permits: the checks overlap
        let parallel = engine_for(&server, |request| request.concurrency = 4);
        let started = std::time::Instant::now();
        let links = parallel.crawl(root, 1).await;
        let parallel_elapsed = started.elapsed();
        assert_eq!(links.len(), 4);
        assert!(
            parallel_elapsed < DELAY * 3,
            "limit 4 took {:?}",
            parallel_elapsed
        );
    }

    #[tokio::test]
    async fn test_failure_rate_trips_the_engine() {
        let engine = CrawlEngine::new(
            Client::new(),
            &CrawlRequest {
                failure_threshold: FailureThreshold {
                    min_samples: 1,
                    ratio: 0.5,
                },
                ..CrawlRequest::new(["http://127.0.0.1:9/"], "127.0.0.1")
            },
        );

        let links = engine.crawl("http://127.0.0.1:9/".to_string(), 2).await;
        assert!(links.is_empty());
        assert!(matches!(
            engine.failure(),
            Some(CrawlError::FailureRateExceeded { failed: 1, attempted: 1 })
        ));

        // Once tripped, nothing new is expanded
        engine.crawl("http://127.0.0.1:9/other".to_string(), 2).await;
        assert_eq!(engine.summary().pages_expanded, 1);
    }
}
