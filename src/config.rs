// src/config.rs
// =============================================================================
// This module holds the configuration of one crawl.
//
// A CrawlRequest bundles everything the crawler needs to know:
// - where to start (seed URLs) and which hosts are in scope
// - what counts as a "good" link (expected status code)
// - how far and how wide to go (depth, concurrency, visited-set size)
// - how to talk HTTP (timeout, user agent, redirect policy)
// - which external harvesters to run, and where to write the results
//
// The CLI builds one of these from its arguments, but library users can
// build it directly with CrawlRequest::new and struct update syntax.
//
// Rust concepts:
// - Default values via associated constants and Default impls
// - Struct update syntax: CrawlRequest { depth: 2, ..request }
// - Validation returning Result instead of panicking
// =============================================================================

use reqwest::StatusCode;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{CrawlError, Result};
use crate::harvest::Harvester;

/// Request timeout used when the caller does not pick one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Maximum number of URLs remembered by the visited set.
pub const DEFAULT_VISITED_CAPACITY: usize = 10_000;

/// Simultaneous fetches allowed when the caller does not pick a limit.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Browser-like user agent, so sites answer us the way they answer visitors
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// When a crawl gives up because too many fetches are failing.
///
/// Single failures are normal on the web. A crawl where almost everything
/// fails usually means a broken setup (no network, wrong proxy, bad client)
/// and should say so instead of quietly returning nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureThreshold {
    /// Attempts needed before the ratio is trusted
    pub min_samples: usize,
    /// Failed / attempted ratio above which the crawl aborts
    pub ratio: f64,
}

impl Default for FailureThreshold {
    fn default() -> Self {
        Self {
            min_samples: 50,
            ratio: 0.9,
        }
    }
}

impl FailureThreshold {
    /// Returns true once `failed` out of `attempted` crosses the threshold
    pub fn is_exceeded(&self, failed: usize, attempted: usize) -> bool {
        attempted > 0
            && attempted >= self.min_samples
            && (failed as f64 / attempted as f64) > self.ratio
    }
}

// Everything one crawl needs
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Starting points, already trimmed, blank entries removed
    pub seeds: Vec<String>,
    /// Host that discovered links must belong to
    pub domain: String,
    /// Also accept hosts like "api.example.com" for domain "example.com"
    pub include_subdomains: bool,
    /// Links are kept only if they answer with exactly this status
    pub expected_status: u16,
    /// Link-following hops from each seed (1 = links on the seed page)
    pub depth: u32,
    /// Maximum simultaneous HTTP fetches
    pub concurrency: usize,
    /// External tools to run for the domain
    pub harvesters: Vec<Harvester>,
    pub timeout: Duration,
    pub visited_capacity: usize,
    pub user_agent: String,
    pub follow_redirects: bool,
    /// Optional file receiving one URL per line
    pub output: Option<PathBuf>,
    pub failure_threshold: FailureThreshold,
}

impl CrawlRequest {
    /// Creates a request with default settings
    ///
    /// Seeds are trimmed and blank ones dropped, the same way lines pasted
    /// into a text box would be cleaned up.
    pub fn new<I, S>(seeds: I, domain: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seeds = seeds
            .into_iter()
            .map(|seed| seed.as_ref().trim().to_string())
            .filter(|seed| !seed.is_empty())
            .collect();

        Self {
            seeds,
            domain: normalize_domain(domain),
            include_subdomains: false,
            expected_status: 200,
            depth: 1,
            concurrency: DEFAULT_CONCURRENCY,
            harvesters: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            visited_capacity: DEFAULT_VISITED_CAPACITY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            follow_redirects: false,
            output: None,
            failure_threshold: FailureThreshold::default(),
        }
    }

    /// Checks the request before any network work starts
    pub fn validate(&self) -> Result<()> {
        if self.seeds.is_empty() {
            return Err(invalid("at least one seed URL is required"));
        }
        if self.domain.is_empty() {
            return Err(invalid("a target domain is required"));
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency limit must be at least 1"));
        }
        if self.visited_capacity == 0 {
            return Err(invalid("visited set capacity must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(invalid("timeout must be greater than zero"));
        }
        if StatusCode::from_u16(self.expected_status).is_err() {
            return Err(invalid(&format!(
                "{} is not a valid HTTP status code",
                self.expected_status
            )));
        }
        let ratio = self.failure_threshold.ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(invalid(&format!(
                "failure ratio must be between 0 and 1, got {}",
                ratio
            )));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> CrawlError {
    CrawlError::InvalidRequest(message.to_string())
}

/// Lowercases a domain and strips surrounding whitespace and a trailing dot,
/// matching how the url crate reports hosts.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Host of a URL, used as the default domain when none is given
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .and_then(|url| url.host_str().map(normalize_domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_and_drops_blank_seeds() {
        let request = CrawlRequest::new(
            ["  https://example.com  ", "", "   ", "https://example.com/about"],
            "Example.COM",
        );
        assert_eq!(
            request.seeds,
            vec!["https://example.com", "https://example.com/about"]
        );
        assert_eq!(request.domain, "example.com");
    }

    #[test]
    fn test_defaults() {
        let request = CrawlRequest::new(["https://example.com"], "example.com");
        assert_eq!(request.timeout, Duration::from_secs(20));
        assert_eq!(request.visited_capacity, 10_000);
        assert_eq!(request.expected_status, 200);
        assert!(!request.follow_redirects);
        assert!(request.harvesters.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_seeds() {
        let request = CrawlRequest::new(["", "  "], "example.com");
        assert!(matches!(
            request.validate(),
            Err(CrawlError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let request = CrawlRequest {
            concurrency: 0,
            ..CrawlRequest::new(["https://example.com"], "example.com")
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bogus_status() {
        let request = CrawlRequest {
            expected_status: 42,
            ..CrawlRequest::new(["https://example.com"], "example.com")
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_failure_ratio() {
        for ratio in [-0.5, 1.5, f64::NAN, f64::INFINITY] {
            let request = CrawlRequest {
                failure_threshold: FailureThreshold {
                    min_samples: 1,
                    ratio,
                },
                ..CrawlRequest::new(["https://example.com"], "example.com")
            };
            assert!(
                matches!(request.validate(), Err(CrawlError::InvalidRequest(_))),
                "ratio {} was accepted",
                ratio
            );
        }

        // Both ends of the range are fine
        for ratio in [0.0, 1.0] {
            let request = CrawlRequest {
                failure_threshold: FailureThreshold {
                    min_samples: 1,
                    ratio,
                },
                ..CrawlRequest::new(["https://example.com"], "example.com")
            };
            assert!(request.validate().is_ok());
        }
    }

    #[test]
    fn test_failure_threshold() {
        let threshold = FailureThreshold {
            min_samples: 10,
            ratio: 0.5,
        };
        // Not enough samples yet, even though everything failed
        assert!(!threshold.is_exceeded(9, 9));
        assert!(threshold.is_exceeded(6, 10));
        assert!(!threshold.is_exceeded(5, 10));
    }

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://API.example.com/path"),
            Some("api.example.com".to_string())
        );
        assert_eq!(host_of("not a url"), None);
    }
}
