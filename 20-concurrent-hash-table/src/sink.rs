//! Append-only, internally serialized line sink.
//!
//! Both the event log and the result file are append-only streams written by
//! many threads at once. [`LineSink`] holds the writer behind one mutex, so
//! lines never interleave.
//!
//! A recording sink also keeps every item it appended, in write order. Only
//! [`LineSink::in_memory`] and [`LineSink::recording`] record; file sinks
//! don't keep a second copy of what they write.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::Path;

use parking_lot::Mutex;
use tracing::warn;

struct Inner<T> {
    writer: Box<dyn Write + Send>,
    history: Option<Vec<T>>,
}

/// Thread-safe sink of displayable items, one item per line.
pub struct LineSink<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Display + Clone> LineSink<T> {
    /// Wraps an arbitrary writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self::with_history(writer, None)
    }

    /// Wraps `writer` and also keeps every appended item.
    pub fn recording(writer: impl Write + Send + 'static) -> Self {
        Self::with_history(writer, Some(Vec::new()))
    }

    fn with_history(writer: impl Write + Send + 'static, history: Option<Vec<T>>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                writer: Box::new(writer),
                history,
            }),
        }
    }

    /// Creates (or truncates) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(LineWriter::new(file)))
    }

    /// A sink that only keeps history.
    pub fn in_memory() -> Self {
        Self::recording(io::sink())
    }

    /// Appends one item.
    pub fn append(&self, item: T) {
        self.append_with(|| item);
    }

    /// Builds the item while holding the sink, then appends it.
    ///
    /// Anything `make` observes (a clock, say) is therefore read in the same
    /// order the lines end up in the sink.
    pub fn append_with(&self, make: impl FnOnce() -> T) -> T {
        let mut inner = self.inner.lock();
        let item = make();
        if let Err(err) = writeln!(inner.writer, "{item}").and_then(|()| inner.writer.flush()) {
            warn!(error = %err, "failed to write line");
        }
        if let Some(history) = inner.history.as_mut() {
            history.push(item.clone());
        }
        item
    }

    /// Appends several items without letting other writers in between.
    pub fn append_all(&self, items: impl IntoIterator<Item = T>) {
        let mut inner = self.inner.lock();
        for item in items {
            if let Err(err) = writeln!(inner.writer, "{item}") {
                warn!(error = %err, "failed to write line");
            }
            if let Some(history) = inner.history.as_mut() {
                history.push(item);
            }
        }
        if let Err(err) = inner.writer.flush() {
            warn!(error = %err, "failed to flush sink");
        }
    }

    /// Returns a copy of everything appended so far. Empty unless the sink
    /// records.
    pub fn history(&self) -> Vec<T> {
        self.inner.lock().history.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_line_per_item() {
        let buf = SharedBuf::default();
        let sink = LineSink::recording(buf.clone());
        sink.append("first".to_string());
        sink.append_all(["second".to_string(), "third".to_string()]);

        let written = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!(written, "first\nsecond\nthird\n");
        assert_eq!(sink.history(), vec!["first", "second", "third"]);
    }

    #[test]
    fn concurrent_writers_never_interleave() {
        let buf = SharedBuf::default();
        let sink = Arc::new(LineSink::recording(buf.clone()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..50 {
                        sink.append(format!("thread {t} line {i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let written = String::from_utf8(buf.0.lock().clone()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 400);
        assert!(lines.iter().all(|line| line.starts_with("thread ")));
        assert_eq!(lines, sink.history());
    }

    #[test]
    fn plain_sinks_keep_no_history() {
        let buf = SharedBuf::default();
        let sink = LineSink::new(buf.clone());
        sink.append("first".to_string());
        sink.append_all(["second".to_string()]);

        let written = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!(written, "first\nsecond\n");
        assert!(sink.history().is_empty());
    }
}
