//! Command line arguments.

use super::app_config::LogLevel;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command line interface.
#[derive(Debug, Parser)]
#[command(
    name = "picache",
    version,
    about = "Cache-first picture loader for chat clients",
    long_about = None
)]
pub struct CliArgs {
    /// Options overriding the configuration file.
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Global options that override configuration file values.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Cache root directory.
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_root: Option<PathBuf>,

    /// Network request timeout in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load a picture through the cache, fetching it on a miss.
    Fetch {
        /// Picture URL.
        url: String,

        /// Maximum width of the output (0 disables resizing).
        #[arg(long, default_value_t = 0)]
        max_width: u32,

        /// Maximum height of the output (0 disables resizing).
        #[arg(long, default_value_t = 0)]
        max_height: u32,

        /// Write the (resized) picture to this file.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Give up and cancel after this many seconds.
        #[arg(long, value_name = "SECS")]
        deadline: Option<u64>,
    },
    /// Remove one URL from the cache.
    Invalidate {
        /// Picture URL.
        url: String,
    },
    /// Remove every cached picture.
    Clear,
    /// Print the cache key and entry path for a URL.
    Key {
        /// Picture URL.
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let args = CliArgs::try_parse_from([
            "picache",
            "--log-level",
            "debug",
            "fetch",
            "http://host/a.png",
            "--max-width",
            "200",
            "--max-height",
            "150",
            "--deadline",
            "10",
        ])
        .unwrap();

        assert_eq!(args.overrides.log_level, Some(LogLevel::Debug));
        match args.command {
            Command::Fetch {
                url,
                max_width,
                max_height,
                output,
                deadline,
            } => {
                assert_eq!(url, "http://host/a.png");
                assert_eq!((max_width, max_height), (200, 150));
                assert!(output.is_none());
                assert_eq!(deadline, Some(10));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_option_after_subcommand() {
        let args =
            CliArgs::try_parse_from(["picache", "clear", "--cache-root", "/tmp/c"]).unwrap();

        assert!(matches!(args.command, Command::Clear));
        assert_eq!(args.overrides.cache_root, Some(PathBuf::from("/tmp/c")));
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(CliArgs::try_parse_from(["picache"]).is_err());
    }
}
