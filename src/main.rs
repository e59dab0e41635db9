// src/main.rs
// =============================================================================
// This is the entry point of the link-scout CLI.
//
// What happens here:
// 1. Set up logging (tracing) so warnings go to stderr
// 2. Parse command-line arguments using clap
// 3. Dispatch to the appropriate subcommand handler
// 4. Print results to stdout (plain list or JSON)
// 5. Exit with proper code (0 = links found, 1 = nothing found, 2 = error)
//
// Logs go to stderr and results to stdout, so
//     link-scout crawl https://example.com > links.txt
// captures only the URLs. Set RUST_LOG=link_scout=debug to watch the crawl.
// =============================================================================

mod cli;

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands, CrawlArgs};
use link_scout::crawl::LinkExtractor;
use link_scout::{CrawlRequest, CrawlResult, CrawlSession};

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins if set; otherwise show our own info-level messages
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "link_scout=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// Returns:
//   Ok(0) = at least one link found
//   Ok(1) = the crawl worked but found nothing
//   Ok(2) = the crawl was aborted
//   Err = bad arguments or other unexpected error
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
        Commands::Extract { url, timeout } => handle_extract(&url, timeout).await,
    }
}

async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let json = args.json;
    let request = args.into_request()?;

    match CrawlSession::new(request).run().await {
        Ok(result) => {
            print_result(&result, json)?;
            if result.is_empty() {
                tracing::warn!(
                    "no links found; try a larger depth, another status code or a harvester"
                );
                Ok(1)
            } else {
                Ok(0)
            }
        }
        Err(failure) => {
            // Partial results are not printed: a caller piping our output
            // should never mistake an aborted crawl for a complete one
            tracing::error!(
                partial = failure.partial.len(),
                "crawl aborted: {}",
                failure.error
            );
            Ok(2)
        }
    }
}

async fn handle_extract(url: &str, timeout: u64) -> Result<i32> {
    let request = CrawlRequest {
        timeout: Duration::from_secs(timeout),
        ..CrawlRequest::new([url], "")
    };
    let client = link_scout::crawl::build_client(&request)?;
    let links = LinkExtractor::new(client).extract(url).await?;

    for link in &links {
        println!("{}", link);
    }
    Ok(if links.is_empty() { 1 } else { 0 })
}

fn print_result(result: &CrawlResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        for url in &result.urls {
            println!("{}", url);
        }
        tracing::info!(
            "{} link(s), {} page(s) expanded, {} request(s), {} failed",
            result.len(),
            result.summary.pages_expanded,
            result.summary.fetches_attempted,
            result.summary.fetches_failed
        );
    }
    Ok(())
}
