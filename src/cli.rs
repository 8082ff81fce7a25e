//! Command-line surface and its merge with the config file

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::delete::CollapseMode;
use crate::logger::LogFormat;
use crate::sync::SyncOptions;

/// Command-line arguments
#[derive(Clone, Debug, Parser)]
#[command(
    name = "mega-sync-one-way",
    author,
    version,
    about = "Mirror a local directory onto a MEGA remote directory (uploads new content, deletes what is gone locally)"
)]
pub struct Args {
    /// Local directory to mirror
    pub local_dir: PathBuf,

    /// Remote directory (made absolute if relative)
    pub remote_dir: String,

    /// Glob patterns, relative to LOCAL_DIR, of paths never uploaded
    #[arg(long, value_name = "PATTERN", num_args = 1.., action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Print the plan without changing anything on the remote
    #[arg(long = "dryrun", alias = "dry-run")]
    pub dry_run: bool,

    /// Config file (default: $MEGA_SYNC_CONFIG or ~/.config/mega-sync/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Prefix of the remote tool commands
    #[arg(long, value_name = "PREFIX")]
    pub tool_prefix: Option<String>,

    /// Append an action log to this file
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Action log format
    #[arg(long = "log-format", value_enum)]
    pub log_format: Option<LogFormat>,

    /// How deletions below an already deleted directory are dropped
    #[arg(long, value_enum)]
    pub collapse: Option<CollapseMode>,

    /// Kill any remote command running longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Show listing sizes, plan totals and ignored command failures
    #[arg(short, long)]
    pub verbose: bool,
}

/// Effective settings after merging flags over the config file.
#[derive(Clone, Debug)]
pub struct Settings {
    pub tool_prefix: String,
    pub timeout: Option<Duration>,
    pub log_file: Option<PathBuf>,
    pub log_format: LogFormat,
    pub options: SyncOptions,
}

impl Args {
    pub fn settings(&self, config: Config) -> Settings {
        let mut excludes = config.excludes;
        excludes.extend(self.exclude.iter().cloned());

        Settings {
            tool_prefix: self.tool_prefix.clone().unwrap_or(config.tool_prefix),
            timeout: self
                .timeout
                .or(config.command_timeout_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            log_file: self.log_file.clone().or(config.log_file),
            log_format: self.log_format.unwrap_or(config.log_format),
            options: SyncOptions {
                excludes,
                dry_run: self.dry_run,
                collapse: self.collapse.unwrap_or(config.collapse),
                verbose: self.verbose,
            },
        }
    }
}
