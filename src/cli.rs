//! Command-line interface definitions for Feed Snapshots.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also be provided through an environment variable.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Feed Snapshots application.
///
/// Flags given here override the matching keys of the YAML config file.
///
/// # Examples
///
/// ```sh
/// # Refresh with the built-in sources
/// feed_snapshots
///
/// # Custom sources, and overwrite today's snapshot with the fresh view
/// feed_snapshots -c feeds.yaml --save-now
///
/// # Also write a bootstrap file for the next deployment
/// feed_snapshots -j ./public/data
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a feeds YAML file
    #[arg(short, long, env = "FEEDS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Snapshot store file
    #[arg(short, long, env = "SNAPSHOT_STORE", default_value = "data/snapshots.json")]
    pub store: PathBuf,

    /// Bootstrap data file path or http(s) URL
    #[arg(long, env = "SEED_FILE", default_value = "data/news.json")]
    pub seed_file: String,

    /// Per-source fetch timeout in seconds (config file value, or 20)
    #[arg(long, env = "FETCH_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Extra attempts per source after a failed fetch
    #[arg(long, env = "FETCH_RETRIES")]
    pub retries: Option<usize>,

    /// URL prefix prepended to every feed endpoint
    #[arg(long, env = "PROXY_PREFIX")]
    pub proxy_prefix: Option<String>,

    /// Overwrite today's snapshot with the fresh view
    #[arg(long)]
    pub save_now: bool,

    /// Write a bootstrap data file (news.json) into this directory
    #[arg(short = 'j', long, env = "EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// Print the stored snapshot days and today's snapshot
    #[arg(long)]
    pub history: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["feed_snapshots"]);

        assert_eq!(cli.store, PathBuf::from("data/snapshots.json"));
        assert_eq!(cli.seed_file, "data/news.json");
        assert_eq!(cli.timeout_secs, None);
        assert_eq!(cli.retries, None);
        assert!(!cli.save_now);
        assert!(!cli.history);
        assert!(cli.export_dir.is_none());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "feed_snapshots",
            "--config",
            "feeds.yaml",
            "--seed-file",
            "https://example.com/news.json",
            "--timeout-secs",
            "5",
            "--retries",
            "2",
            "--proxy-prefix",
            "https://r.jina.ai/",
            "--save-now",
            "--history",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("feeds.yaml")));
        assert_eq!(cli.seed_file, "https://example.com/news.json");
        assert_eq!(cli.timeout_secs, Some(5));
        assert_eq!(cli.retries, Some(2));
        assert_eq!(cli.proxy_prefix.as_deref(), Some("https://r.jina.ai/"));
        assert!(cli.save_now);
        assert!(cli.history);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "feed_snapshots",
            "-c",
            "/tmp/feeds.yaml",
            "-s",
            "/tmp/store.json",
            "-j",
            "/tmp/out",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/feeds.yaml")));
        assert_eq!(cli.store, PathBuf::from("/tmp/store.json"));
        assert_eq!(cli.export_dir, Some(PathBuf::from("/tmp/out")));
    }
}
