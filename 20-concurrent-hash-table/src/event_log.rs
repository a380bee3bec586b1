//! Timestamped, thread-tagged event log.
//!
//! Every worker step (waiting, activation, each command, each lock
//! acquire/release) becomes one line of the form
//! `<timestamp>: THREAD <id> <message>`. After the run the scheduler appends
//! bare summary lines (lock counts and the final table) with [`EventLog::note`].
//!
//! Lines from different threads appear in the order each thread got into the
//! sink; timestamps are taken inside the sink, so they never go backwards.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::trace;

use crate::sink::LineSink;

/// Identifier of a worker thread (its job index).
pub type ThreadId = usize;

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Something a worker did.
    Event {
        /// Microseconds since the Unix epoch.
        timestamp: u64,
        thread: ThreadId,
        message: String,
    },
    /// A bare line with no timestamp or thread.
    Note(String),
}

impl LogEntry {
    /// The thread that logged this entry, if any.
    pub fn thread(&self) -> Option<ThreadId> {
        match self {
            LogEntry::Event { thread, .. } => Some(*thread),
            LogEntry::Note(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LogEntry::Event { message, .. } => message,
            LogEntry::Note(message) => message,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Event {
                timestamp,
                thread,
                message,
            } => write!(f, "{timestamp}: THREAD {thread} {message}"),
            LogEntry::Note(message) => f.write_str(message),
        }
    }
}

/// Wall-clock origin advanced by a monotonic clock.
struct Clock {
    origin_micros: u64,
    started: Instant,
}

impl Clock {
    fn start() -> Self {
        let origin_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_micros() as u64)
            .unwrap_or(0);
        Self {
            origin_micros,
            started: Instant::now(),
        }
    }

    fn now_micros(&self) -> u64 {
        self.origin_micros + self.started.elapsed().as_micros() as u64
    }
}

/// Process-wide event log shared by the scheduler and every worker.
pub struct EventLog {
    sink: LineSink<LogEntry>,
    clock: Clock,
}

impl EventLog {
    /// Logs to the file at `path`, truncating it.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            sink: LineSink::create(path)?,
            clock: Clock::start(),
        })
    }

    /// Keeps entries in memory only.
    pub fn in_memory() -> Self {
        Self {
            sink: LineSink::in_memory(),
            clock: Clock::start(),
        }
    }

    /// Appends an event for `thread`.
    pub fn log(&self, thread: ThreadId, message: impl Into<String>) {
        let message = message.into();
        let entry = self.sink.append_with(|| LogEntry::Event {
            timestamp: self.clock.now_micros(),
            thread,
            message,
        });
        trace!(thread, "{}", entry.message());
    }

    /// Appends a bare line.
    pub fn note(&self, message: impl Into<String>) {
        self.sink.append(LogEntry::Note(message.into()));
    }

    /// Appends several bare lines as one uninterrupted block.
    pub fn note_all<I>(&self, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.sink
            .append_all(messages.into_iter().map(|m| LogEntry::Note(m.into())));
    }

    /// Snapshot of every entry so far, in log order. Only an in-memory log
    /// keeps its entries; a file-backed one returns nothing.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.sink.history()
    }

    /// Messages logged by `thread`, in order.
    pub fn messages_from(&self, thread: ThreadId) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.thread() == Some(thread))
            .map(|entry| entry.message().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_line_format() {
        let entry = LogEntry::Event {
            timestamp: 1_700_000_000_123_456,
            thread: 3,
            message: "AWAKENED FOR WORK".into(),
        };
        assert_eq!(
            entry.to_string(),
            "1700000000123456: THREAD 3 AWAKENED FOR WORK"
        );
        assert_eq!(LogEntry::Note("Final Table:".into()).to_string(), "Final Table:");
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let log = EventLog::in_memory();
        for i in 0..100 {
            log.log(i % 4, format!("event {i}"));
        }

        let stamps: Vec<u64> = log
            .entries()
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Event { timestamp, .. } => Some(*timestamp),
                LogEntry::Note(_) => None,
            })
            .collect();
        assert_eq!(stamps.len(), 100);
        assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn notes_and_events_share_one_order() {
        let log = EventLog::in_memory();
        log.log(0, "PRINT");
        log.note("Number of lock acquisitions: 1");
        log.note_all(["Final Table:", "1,a,2"]);

        let lines: Vec<String> = log.entries().iter().map(|e| e.message().to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "PRINT",
                "Number of lock acquisitions: 1",
                "Final Table:",
                "1,a,2"
            ]
        );
        assert_eq!(log.messages_from(0), vec!["PRINT"]);
    }
}
