//! Runs a command file against the shared record store.
//!
//! ```bash
//! cargo run -p concurrent-hash-table -- --commands commands.txt
//! RUST_LOG=debug cargo run -p concurrent-hash-table
//! ```

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{info, warn};

use concurrent_hash_table::cli::Cli;
use concurrent_hash_table::context::Context;
use concurrent_hash_table::scheduler::Scheduler;
use concurrent_hash_table::source::CommandFile;

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let file = CommandFile::open(&cli.commands)
        .with_context(|| format!("could not read {}", cli.commands.display()))?;
    let ctx = Context::create(&cli.log, &cli.output).with_context(|| {
        format!(
            "could not create {} or {}",
            cli.log.display(),
            cli.output.display()
        )
    })?;

    let report = Scheduler::new(ctx, file).run()?;
    info!(
        acquisitions = report.stats.acquisitions,
        releases = report.stats.releases,
        records = report.final_table.len(),
        "run complete"
    );
    if !report.panicked.is_empty() {
        warn!(workers = ?report.panicked, "some workers panicked");
    }

    Ok(())
}
