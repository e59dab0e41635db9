// src/harvest/tool.rs
// =============================================================================
// Spawning one harvester process and reading its output.
//
// Rust concepts:
// - tokio::process::Command: like std::process::Command, but .output()
//   is async, so other crawl work keeps running while the tool does
// - map_err: turning a low-level io::Error into our own error type
// =============================================================================

use futures::future::join_all;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::HarvestError;

/// An external tool that prints URLs for a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harvester {
    /// Name used in log messages
    pub name: String,
    /// Binary to run (looked up on PATH if not a path)
    pub program: String,
    /// Arguments placed before the domain
    pub args: Vec<String>,
}

impl Harvester {
    pub fn new(name: &str, program: &str) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// GetAllUrls: https://github.com/lc/gau
    pub fn gau() -> Self {
        Self::new("gau", "gau")
    }

    /// https://github.com/tomnomnom/waybackurls
    pub fn waybackurls() -> Self {
        Self::new("waybackurls", "waybackurls")
    }

    /// Runs the tool for `domain` and returns the URLs it printed
    pub async fn harvest(&self, domain: &str) -> Result<Vec<String>, HarvestError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(domain)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| HarvestError::Spawn {
                tool: self.name.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(HarvestError::ExitStatus {
                tool: self.name.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Runs every harvester at once and concatenates what they found
///
/// A failing tool is logged and skipped; it never fails the crawl.
pub async fn harvest_all(harvesters: &[Harvester], domain: &str) -> Vec<String> {
    let runs = harvesters.iter().map(|harvester| async move {
        match harvester.harvest(domain).await {
            Ok(urls) => {
                info!(tool = %harvester.name, count = urls.len(), "harvester finished");
                urls
            }
            Err(e) => {
                warn!(tool = %harvester.name, %domain, "harvester failed: {}", e);
                Vec::new()
            }
        }
    });

    join_all(runs).await.into_iter().flatten().collect()
}

// One URL per line; surrounding whitespace and blank lines are ignored
fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
