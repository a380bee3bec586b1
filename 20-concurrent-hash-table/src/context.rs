//! Shared state handed to every worker.

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::dispatch::ResultSink;
use crate::event_log::EventLog;
use crate::lock::TableLock;
use crate::store::RecordStore;

/// The event log, the result sink and the locked store.
///
/// Workers each hold an `Arc<Context>`. The log and result sinks are `Arc`s
/// of their own so callers can keep reading them after the scheduler has
/// taken the context apart.
pub struct Context {
    pub events: Arc<EventLog>,
    pub results: Arc<ResultSink>,
    pub table: TableLock,
}

impl Context {
    /// Builds a context around an empty store.
    pub fn new(events: Arc<EventLog>, results: Arc<ResultSink>) -> Self {
        let table = TableLock::new(RecordStore::new(), Arc::clone(&events));
        Self {
            events,
            results,
            table,
        }
    }

    /// Creates (truncating) the log and result files.
    pub fn create(log_path: impl AsRef<Path>, output_path: impl AsRef<Path>) -> io::Result<Self> {
        let events = Arc::new(EventLog::create(log_path)?);
        let results = Arc::new(ResultSink::create(output_path)?);
        Ok(Self::new(events, results))
    }

    /// Context whose sinks only keep history.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(EventLog::in_memory()),
            Arc::new(ResultSink::in_memory()),
        )
    }
}
