//! Runs one worker's command against the store.
//!
//! Every operation follows the same shape: compute the key's digest, log the
//! operation before touching any lock, take the lock(s) it needs, then append
//! a human-readable [`Outcome`] to the result sink.
//!
//! `delete` and `update` take a read lock first to capture the record as it
//! was, release it, and only then take the write lock for the mutation.
//! `search` and `print` only ever read.

use std::fmt;

use tracing::debug;

use crate::command::Command;
use crate::context::Context;
use crate::digest::digest;
use crate::error::DispatchError;
use crate::event_log::ThreadId;
use crate::sink::LineSink;
use crate::store::Record;

/// The result file: one [`Outcome`] per dispatched command.
pub type ResultSink = LineSink<Outcome>;

/// What a command did, rendered as its line(s) in the result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted(Record),
    DuplicateInsert {
        digest: u32,
    },
    /// `value` is the value seen just before the delete, if it was seen.
    Deleted {
        digest: u32,
        key: String,
        value: Option<u32>,
    },
    DeleteMissing {
        digest: u32,
    },
    Updated {
        digest: u32,
        key: String,
        old: Option<u32>,
        new: u32,
    },
    UpdateMissing {
        digest: u32,
    },
    Found(Record),
    NotFound {
        key: String,
    },
    /// Full dump, in store order.
    Table(Vec<Record>),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Inserted(record) => write!(f, "Inserted {record}"),
            Outcome::DuplicateInsert { digest } => {
                write!(f, "Insert failed. Entry {digest} is a duplicate.")
            }
            Outcome::Deleted {
                digest,
                key,
                value: Some(value),
            } => write!(f, "Deleted record for {digest},{key},{value}"),
            Outcome::Deleted {
                digest,
                key,
                value: None,
            } => write!(f, "Deleted record for {digest},{key},UNKNOWN"),
            Outcome::DeleteMissing { digest } => {
                write!(f, "Entry {digest} not deleted. Not in database.")
            }
            Outcome::Updated {
                digest,
                key,
                old: Some(old),
                new,
            } => write!(
                f,
                "Updated record {digest} from {digest},{key},{old} to {digest},{key},{new}"
            ),
            Outcome::Updated {
                digest,
                key,
                old: None,
                new,
            } => write!(
                f,
                "Updated record {digest} from UNKNOWN to {digest},{key},{new}"
            ),
            Outcome::UpdateMissing { digest } => {
                write!(f, "Update failed. Entry {digest} not found.")
            }
            Outcome::Found(record) => write!(f, "Found: {record}"),
            Outcome::NotFound { key } => write!(f, "No Record Found: {key}"),
            Outcome::Table(records) => {
                f.write_str("Current Database:")?;
                for record in records {
                    write!(f, "\n{record}")?;
                }
                Ok(())
            }
        }
    }
}

/// Executes `command` for `worker`, logging and locking as it goes.
///
/// The outcome is appended to the context's result sink and also returned.
///
/// # Errors
/// [`DispatchError::UnknownOperation`] for [`Command::Unknown`]. The store is
/// not touched and nothing is written to the result sink.
pub fn dispatch(
    ctx: &Context,
    worker: ThreadId,
    command: &Command,
) -> Result<Outcome, DispatchError> {
    debug!(worker, operation = command.name(), "dispatching");
    let outcome = match command {
        Command::Insert { key, value } => insert(ctx, worker, key, *value),
        Command::Delete { key } => delete(ctx, worker, key),
        Command::Update { key, value } => update(ctx, worker, key, *value),
        Command::Search { key } => search(ctx, worker, key),
        Command::Print => print(ctx, worker),
        Command::Unknown { line } => {
            ctx.events.log(worker, format!("UNKNOWN COMMAND: {line}"));
            return Err(DispatchError::UnknownOperation { line: line.clone() });
        }
    };
    Ok(outcome)
}

fn insert(ctx: &Context, worker: ThreadId, key: &str, value: u32) -> Outcome {
    let digest = digest(key);
    ctx.events.log(worker, format!("INSERT,{digest},{key},{value}"));

    let result = ctx.table.write(worker).insert(key, value);

    let outcome = match result {
        Ok(record) => Outcome::Inserted(record),
        Err(_) => Outcome::DuplicateInsert { digest },
    };
    ctx.results.append(outcome.clone());
    outcome
}

fn delete(ctx: &Context, worker: ThreadId, key: &str) -> Outcome {
    let digest = digest(key);
    ctx.events.log(worker, format!("DELETE,{digest},{key}"));

    let before = ctx.table.read(worker).search(key);
    let result = ctx.table.write(worker).delete(key);

    let outcome = match result {
        Ok(_) => Outcome::Deleted {
            digest,
            key: key.to_string(),
            value: before.map(|record| record.value),
        },
        Err(_) => Outcome::DeleteMissing { digest },
    };
    ctx.results.append(outcome.clone());
    outcome
}

fn update(ctx: &Context, worker: ThreadId, key: &str, value: u32) -> Outcome {
    let digest = digest(key);
    ctx.events.log(worker, format!("UPDATE,{digest},{key},{value}"));

    let before = ctx.table.read(worker).search(key);
    let result = ctx.table.write(worker).update(key, value);

    let outcome = match result {
        Ok(_) => Outcome::Updated {
            digest,
            key: key.to_string(),
            old: before.map(|record| record.value),
            new: value,
        },
        Err(_) => Outcome::UpdateMissing { digest },
    };
    ctx.results.append(outcome.clone());
    outcome
}

fn search(ctx: &Context, worker: ThreadId, key: &str) -> Outcome {
    let digest = digest(key);
    ctx.events.log(worker, format!("SEARCH,{digest},{key}"));

    let found = ctx.table.read(worker).search(key);

    let outcome = match found {
        Some(record) => Outcome::Found(record),
        None => Outcome::NotFound {
            key: key.to_string(),
        },
    };
    ctx.results.append(outcome.clone());
    outcome
}

/// Dumps the table. The dump is written while the read lock is still held.
fn print(ctx: &Context, worker: ThreadId) -> Outcome {
    ctx.events.log(worker, "PRINT");

    let reader = ctx.table.read(worker);
    let outcome = Outcome::Table(reader.dump());
    ctx.results.append(outcome.clone());
    reader.release();
    outcome
}
