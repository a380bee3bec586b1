use std::path::PathBuf;

use clap::{Parser, ValueHint};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Run ordered worker threads against a shared record store")]
pub struct Cli {
    /// Command file: `threads,<N>[,<start>]` followed by one command per worker.
    #[arg(long, default_value = "commands.txt", value_hint = ValueHint::FilePath)]
    pub commands: PathBuf,

    /// Result file, truncated before the run.
    #[arg(long, default_value = "output.txt", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Event log file, truncated before the run.
    #[arg(long, default_value = "hash.log", value_hint = ValueHint::FilePath)]
    pub log: PathBuf,
}
