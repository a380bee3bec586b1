//! Error types for store operations, configuration, and dispatch.

use std::io;

use thiserror::Error;

/// Failures reported by [`crate::store::RecordStore`] operations.
///
/// Both are recovered locally: the dispatcher turns them into result lines
/// and the worker finishes normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A record with the same digest and key already exists.
    #[error("entry {digest} is a duplicate")]
    Duplicate {
        /// Digest of the rejected key.
        digest: u32,
    },

    /// No record matches the digest and key.
    #[error("entry {digest} ({key}) not found")]
    NotFound {
        /// Digest of the missing key.
        digest: u32,
        /// The key that was looked up.
        key: String,
    },
}

/// The first line of the command file could not be understood.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Not of the form `threads,<N>[,<start>]` with `N > 0`.
    #[error("malformed config line {line:?}: {reason}")]
    Malformed {
        /// The offending line.
        line: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// A worker's command could not be dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The first field does not name a known operation.
    #[error("unknown command: {line}")]
    UnknownOperation {
        /// The full command line as assigned to the worker.
        line: String,
    },
}

/// Failures while reading the command file.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The config line was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The file has no config line at all.
    #[error("command file is empty")]
    Empty,
}
