//! Reads the command file: one config line, then one line per worker.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::command::JobConfig;
use crate::error::SourceError;

/// Parsed contents of a command file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFile {
    pub config: JobConfig,
    /// Exactly `config.workers` lines; missing ones are empty.
    pub lines: Vec<String>,
}

impl CommandFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Reads the config line and the worker lines that follow it.
    ///
    /// Lines past the configured worker count are ignored.
    pub fn read_from(reader: impl BufRead) -> Result<Self, SourceError> {
        let mut lines = reader.lines();
        let first = lines.next().ok_or(SourceError::Empty)??;
        let config = JobConfig::parse(&first)?;

        let mut jobs = Vec::new();
        for line in lines.take(config.workers) {
            jobs.push(strip_line_ending(&line?).to_string());
        }
        jobs.resize(config.workers, String::new());

        Ok(Self {
            config,
            lines: jobs,
        })
    }
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_config_and_jobs() {
        let input = "threads,3,1\r\ninsert,alice,50000,1\r\nsearch,alice,0\ndelete,alice,0\n";
        let file = CommandFile::read_from(Cursor::new(input)).unwrap();
        assert_eq!(
            file.config,
            JobConfig {
                workers: 3,
                start_index: 1
            }
        );
        assert_eq!(
            file.lines,
            vec!["insert,alice,50000,1", "search,alice,0", "delete,alice,0"]
        );
    }

    #[test]
    fn short_files_pad_with_empty_jobs() {
        let file = CommandFile::read_from(Cursor::new("threads,3\nprint\n")).unwrap();
        assert_eq!(file.lines, vec!["print", "", ""]);
    }

    #[test]
    fn extra_lines_are_ignored() {
        let file = CommandFile::read_from(Cursor::new("threads,1\nprint\nprint\n")).unwrap();
        assert_eq!(file.lines, vec!["print"]);
    }

    #[test]
    fn empty_and_malformed_input() {
        assert!(matches!(
            CommandFile::read_from(Cursor::new("")),
            Err(SourceError::Empty)
        ));
        assert!(matches!(
            CommandFile::read_from(Cursor::new("threads,0\n")),
            Err(SourceError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            CommandFile::open("/definitely/not/here/commands.txt"),
            Err(SourceError::Io(_))
        ));
    }
}
