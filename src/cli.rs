// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use clap's "derive" API: the CLI structure is described by Rust
// structs and enums, and the #[...] attributes configure flags, defaults
// and help text.
//
// Subcommands:
// - crawl: the full crawl (seeds -> links with the expected status)
// - extract: show the links the crawler would see on a single page
//
// Rust concepts:
// - Structs and enums: CLI arguments and subcommands
// - Derive macros: clap generates the parsing code for us
// - anyhow::Context: attach a readable message to an error
// =============================================================================

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use link_scout::config::{self, FailureThreshold, DEFAULT_USER_AGENT};
use link_scout::{CrawlRequest, Harvester};

#[derive(Parser, Debug)]
#[command(
    name = "link-scout",
    version = "0.1.0",
    about = "Crawl a website and list every in-scope link that answers with the expected status",
    long_about = "link-scout follows links from one or more seed URLs up to a fixed depth, stays on \
                  the target domain, and keeps the links whose HTTP status matches. Optional \
                  harvesters (gau, waybackurls) add URLs from web archives."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website starting from seed URLs
    ///
    /// Example: link-scout crawl https://example.com --depth 2 --subdomains
    Crawl(CrawlArgs),

    /// Print the candidate links found on a single page
    ///
    /// Example: link-scout extract https://example.com
    Extract {
        /// Page to fetch
        url: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
    },
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Seed URLs to start from
    pub seeds: Vec<String>,

    /// File with more seed URLs, one per line (blank lines are ignored)
    #[arg(long, value_name = "FILE")]
    pub seeds_file: Option<PathBuf>,

    /// Target domain (defaults to the host of the first seed)
    #[arg(long)]
    pub domain: Option<String>,

    /// Also keep links on subdomains of the target domain
    #[arg(long)]
    pub subdomains: bool,

    /// HTTP status a link must answer with to be kept
    #[arg(long, default_value_t = 200)]
    pub status: u16,

    /// How many link hops to follow from each seed
    ///
    /// Depth 1 = links on the seed pages
    /// Depth 2 = ... plus links on those pages, and so on
    #[arg(long, default_value_t = 1)]
    pub depth: u32,

    /// Maximum number of simultaneous requests
    #[arg(long, default_value_t = config::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Run `gau <domain>` and add its URLs
    #[arg(long)]
    pub gau: bool,

    /// Run `waybackurls <domain>` and add its URLs
    #[arg(long)]
    pub waybackurls: bool,

    /// Path to the gau binary
    #[arg(long, default_value = "gau", value_name = "PATH")]
    pub gau_bin: String,

    /// Path to the waybackurls binary
    #[arg(long, default_value = "waybackurls", value_name = "PATH")]
    pub waybackurls_bin: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// How many URLs the visited set remembers before forgetting the oldest
    #[arg(long, default_value_t = config::DEFAULT_VISITED_CAPACITY)]
    pub max_visited: usize,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Follow redirects before comparing the status code
    #[arg(long)]
    pub follow_redirects: bool,

    /// Abort when more than this fraction of requests fail
    #[arg(long, default_value_t = 0.9)]
    pub max_failure_ratio: f64,

    /// Requests needed before --max-failure-ratio applies
    #[arg(long, default_value_t = 50)]
    pub failure_min_samples: usize,

    /// Write the URLs to this file, one per line
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Print the result as JSON instead of a plain list
    #[arg(long)]
    pub json: bool,
}

impl CrawlArgs {
    /// Turns parsed arguments into a validated CrawlRequest
    pub fn into_request(self) -> Result<CrawlRequest> {
        let mut seeds = self.seeds;
        if let Some(path) = &self.seeds_file {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read seeds file {}", path.display()))?;
            seeds.extend(contents.lines().map(str::to_string));
        }

        // Trimming happens in CrawlRequest::new; peek at the first real seed
        // here only to guess the domain
        let domain = match self.domain {
            Some(domain) => domain,
            None => {
                let first = seeds
                    .iter()
                    .map(|seed| seed.trim())
                    .find(|seed| !seed.is_empty());
                match first.and_then(config::host_of) {
                    Some(host) => host,
                    None => bail!("no --domain given and no seed URL with a host to take it from"),
                }
            }
        };

        let mut request = CrawlRequest::new(seeds, &domain);
        request.include_subdomains = self.subdomains;
        request.expected_status = self.status;
        request.depth = self.depth;
        request.concurrency = self.concurrency;
        request.timeout = Duration::from_secs(self.timeout);
        request.visited_capacity = self.max_visited;
        request.user_agent = self.user_agent;
        request.follow_redirects = self.follow_redirects;
        request.output = self.output;
        request.failure_threshold = FailureThreshold {
            min_samples: self.failure_min_samples,
            ratio: self.max_failure_ratio,
        };
        if self.gau {
            request.harvesters.push(Harvester::new("gau", &self.gau_bin));
        }
        if self.waybackurls {
            request
                .harvesters
                .push(Harvester::new("waybackurls", &self.waybackurls_bin));
        }

        request.validate()?;
        Ok(request)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Crawl(CrawlArgs) instead of inline fields?
//    - The crawl command has many flags
//    - A separate #[derive(Args)] struct keeps the enum readable and lets us
//      hang a method (into_request) off the arguments
//
// 2. What is Vec<String> for a positional argument?
//    - clap collects every remaining positional value into the Vec
//    - `link-scout crawl https://a.com https://a.com/blog` gives two seeds
//
// 3. Why validate here and again in the session?
//    - Here we get a friendly error before any work starts
//    - The session still validates, because library users skip the CLI
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CrawlArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Crawl(args) => args,
            other => panic!("expected crawl, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults_match_library() {
        let request = parse(&["link-scout", "crawl", "https://Example.com/start"])
            .into_request()
            .unwrap();
        assert_eq!(request.domain, "example.com");
        assert_eq!(request.depth, 1);
        assert_eq!(request.expected_status, 200);
        assert_eq!(request.timeout, Duration::from_secs(20));
        assert_eq!(request.visited_capacity, 10_000);
        assert!(request.harvesters.is_empty());
    }

    #[test]
    fn test_flags() {
        let request = parse(&[
            "link-scout",
            "crawl",
            "https://example.com",
            "--domain",
            "example.com",
            "--subdomains",
            "--status",
            "404",
            "--depth",
            "3",
            "--concurrency",
            "4",
            "--gau",
            "--waybackurls-bin",
            "/opt/wb",
            "--waybackurls",
        ])
        .into_request()
        .unwrap();

        assert!(request.include_subdomains);
        assert_eq!(request.expected_status, 404);
        assert_eq!(request.depth, 3);
        assert_eq!(request.concurrency, 4);
        assert_eq!(
            request.harvesters,
            vec![Harvester::gau(), Harvester::new("waybackurls", "/opt/wb")]
        );
    }

    #[test]
    fn test_seeds_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seeds.txt");
        std::fs::write(&path, "https://example.com/a\n\n  https://example.com/b  \n").unwrap();

        let request = parse(&["link-scout", "crawl", "--seeds-file", path.to_str().unwrap()])
            .into_request()
            .unwrap();
        assert_eq!(
            request.seeds,
            vec!["https://example.com/a", "https://example.com/b"]
        );
        assert_eq!(request.domain, "example.com");
    }

    #[test]
    fn test_no_seeds_is_an_error() {
        let result = parse(&["link-scout", "crawl", "--domain", "example.com"]).into_request();
        assert!(result.is_err());
    }

    #[test]
    fn test_failure_ratio_out_of_range_is_an_error() {
        let result = parse(&[
            "link-scout",
            "crawl",
            "https://example.com",
            "--max-failure-ratio=1.5",
        ])
        .into_request();
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_command() {
        let cli = Cli::try_parse_from(["link-scout", "extract", "https://example.com"]).unwrap();
        assert!(matches!(cli.command, Commands::Extract { timeout: 20, .. }));
    }
}
