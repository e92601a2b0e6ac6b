//! Command-line interface definitions for the crawler.
//!
//! This module defines the CLI arguments and options using the `clap` crate.

use clap::Parser;

/// Command-line arguments for the crawler.
///
/// Defaults are tuned for polite continuous operation: thirty stories per
/// pass, five parallel downloads, a thirty-second pause between passes.
///
/// # Examples
///
/// ```sh
/// # Continuous polling into ./downloads
/// hncrawl
///
/// # One pass, more parallelism, custom output directory
/// hncrawl --once -m 10 -o /var/archive/hn
///
/// # Through an upstream proxy with debug logging
/// hncrawl --proxy http://127.0.0.1:8118/ -d
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Seconds to wait between polling passes
    #[arg(short, long, default_value_t = 30)]
    pub sleep: u64,

    /// Maximum number of concurrent downloads
    #[arg(short, long, default_value_t = 5)]
    pub max_tasks: usize,

    /// Number of top front-page stories to consider each pass
    #[arg(short, long, default_value_t = 30)]
    pub numbers: usize,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,

    /// Directory where archived pages and the ledger are written
    #[arg(short, long, default_value = "downloads")]
    pub output: String,

    /// Upstream HTTP proxy, e.g. http://127.0.0.1:8118/
    #[arg(long)]
    pub proxy: Option<String>,

    /// Run a single pass and exit instead of polling
    #[arg(long, default_value_t = false)]
    pub once: bool,

    /// Enable debug logging (RUST_LOG overrides this)
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["hncrawl"]);

        assert_eq!(cli.sleep, 30);
        assert_eq!(cli.max_tasks, 5);
        assert_eq!(cli.numbers, 30);
        assert_eq!(cli.timeout, 5);
        assert_eq!(cli.output, "downloads");
        assert_eq!(cli.proxy, None);
        assert!(!cli.once);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "hncrawl", "-s", "60", "-m", "8", "-n", "10", "-t", "15", "-o", "/tmp/hn", "-d",
        ]);

        assert_eq!(cli.sleep, 60);
        assert_eq!(cli.max_tasks, 8);
        assert_eq!(cli.numbers, 10);
        assert_eq!(cli.timeout, 15);
        assert_eq!(cli.output, "/tmp/hn");
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "hncrawl",
            "--once",
            "--proxy",
            "http://127.0.0.1:8118/",
            "--output",
            "./archive",
        ]);

        assert!(cli.once);
        assert_eq!(cli.proxy.as_deref(), Some("http://127.0.0.1:8118/"));
        assert_eq!(cli.output, "./archive");
    }
}
