//! Parsing for the command file's config line and per-worker command lines.
//!
//! The config line is `threads,<N>[,<start>]`. Each command line is
//! comma-separated with the operation name first:
//!
//! - `insert,<key>,<value>,<ignored>`
//! - `delete,<key>,<ignored>`
//! - `update,<key>,<new value>`
//! - `search,<key>,<ignored>`
//! - `print`
//!
//! Command parsing never fails. Missing fields become empty strings, numbers
//! that don't parse become zero, and anything without a known operation name
//! becomes [`Command::Unknown`].

use crate::error::ConfigError;
use crate::store::bounded_key;

/// Largest worker count a config line may ask for. Each worker is an OS
/// thread.
pub const MAX_WORKERS: usize = 1024;

/// Worker count and the worker that runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobConfig {
    pub workers: usize,
    pub start_index: usize,
}

impl JobConfig {
    /// Parses `threads,<N>[,<start>]`.
    ///
    /// A start index of `N` or more wraps around modulo `N`.
    ///
    /// # Errors
    /// [`ConfigError::Malformed`] if the first field is not `threads`, `N` is
    /// missing, not a number, not positive, or above [`MAX_WORKERS`], or
    /// `start` is not a number.
    pub fn parse(line: &str) -> Result<Self, ConfigError> {
        let line = line.trim();
        let malformed = |reason| ConfigError::Malformed {
            line: line.to_string(),
            reason,
        };

        let mut fields = line.split(',').map(str::trim);
        if fields.next() != Some("threads") {
            return Err(malformed("expected `threads` as the first field"));
        }

        let workers: i64 = fields
            .next()
            .filter(|field| !field.is_empty())
            .ok_or_else(|| malformed("missing worker count"))?
            .parse()
            .map_err(|_| malformed("worker count is not a number"))?;
        if workers <= 0 {
            return Err(malformed("worker count must be positive"));
        }
        let workers = usize::try_from(workers)
            .ok()
            .filter(|&workers| workers <= MAX_WORKERS)
            .ok_or_else(|| malformed("worker count too large"))?;

        let start_index = match fields.next().filter(|field| !field.is_empty()) {
            Some(field) => field
                .parse::<usize>()
                .map_err(|_| malformed("start index is not a non-negative number"))?,
            None => 0,
        };

        Ok(Self {
            workers,
            start_index: start_index % workers,
        })
    }

    /// Worker ids in activation order: `start, start + 1, ...` modulo `N`.
    pub fn activation_order(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.workers).map(move |step| (self.start_index + step) % self.workers)
    }
}

/// One worker's assigned operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insert { key: String, value: u32 },
    Delete { key: String },
    Update { key: String, value: u32 },
    Search { key: String },
    Print,
    /// Unrecognized or empty line, kept verbatim for the log.
    Unknown { line: String },
}

impl Command {
    /// Tokenizes a command line. Never fails.
    pub fn parse(line: &str) -> Self {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |index: usize| fields.get(index).copied().unwrap_or_default();
        let key = || bounded_key(field(1)).to_string();

        match field(0) {
            "insert" => Command::Insert {
                key: key(),
                value: parse_lenient(field(2)),
            },
            "delete" => Command::Delete { key: key() },
            "update" => Command::Update {
                key: key(),
                value: parse_lenient(field(2)),
            },
            "search" => Command::Search { key: key() },
            "print" => Command::Print,
            _ => Command::Unknown {
                line: line.to_string(),
            },
        }
    }

    /// Operation name as written in the command file.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Insert { .. } => "insert",
            Command::Delete { .. } => "delete",
            Command::Update { .. } => "update",
            Command::Search { .. } => "search",
            Command::Print => "print",
            Command::Unknown { .. } => "unknown",
        }
    }
}

/// Reads a number the way C's `atoi` does.
///
/// Leading whitespace and one sign are accepted, then as many digits as
/// follow. No digits means zero; negative numbers and overflow wrap.
fn parse_lenient(field: &str) -> u32 {
    let field = field.trim_start();
    let (negative, digits) = match field.as_bytes().first() {
        Some(b'-') => (true, &field[1..]),
        Some(b'+') => (false, &field[1..]),
        _ => (false, field),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, digit| {
            acc.wrapping_mul(10).wrapping_add(u32::from(digit - b'0'))
        });

    if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}
