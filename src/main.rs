//! mega-sync-one-way - mirror a local directory onto a MEGA remote
//!
//! Deletes remote paths that no longer exist locally, then uploads the local
//! tree in as few `put` calls as the exclude patterns allow.

use anyhow::{Context, Result};
use clap::Parser;

use mega_sync::config::Config;
use mega_sync::listing::ListingPatterns;
use mega_sync::logger::{open_logger, Logger, NoopLogger};
use mega_sync::remote::MegaCmd;
use mega_sync::sync::Syncer;
use mega_sync::Args;

fn main() -> Result<()> {
    // Set up Ctrl-C handler
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        // Exit immediately with 130 (128 + SIGINT)
        std::process::exit(130);
    })
    .expect("Error setting Ctrl-C handler");

    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    let settings = args.settings(config);

    // Choose logger once; NoopLogger when no log file is configured
    let logger: Box<dyn Logger> = match settings.log_file {
        Some(ref p) => open_logger(p, settings.log_format)
            .with_context(|| format!("Failed to open log file {}", p.display()))?,
        None => Box::new(NoopLogger),
    };

    let tool = MegaCmd::new(settings.tool_prefix.clone())
        .with_timeout(settings.timeout)
        .with_verbose(settings.options.verbose);
    let patterns = ListingPatterns::compile().context("Failed to compile listing patterns")?;

    let syncer = Syncer::new(&tool, &patterns, logger.as_ref(), settings.options);
    syncer
        .run(&args.local_dir, &args.remote_dir)
        .context("Sync failed")?;

    Ok(())
}
