//! Parser for `git log -z --pretty=format:<marker>%H %ct --name-only` output.
//!
//! With `-z` every changed path is NUL-terminated and printed verbatim, so
//! quotes, backslashes and control characters in names survive intact. A
//! commit starts with a header holding the marker, the full commit id and the
//! unix commit time; the header ends at the first newline and the first path
//! may follow it inside the same NUL-delimited record.

use std::collections::VecDeque;

use crate::vcs::traits::HistoryEntry;
use crate::{ChangesError, ChangesResult};

/// ASCII record separator; starts every commit header.
pub const HEADER_MARKER: char = '\u{1e}';

/// Value for `git log --pretty=` producing headers this parser understands.
pub const PRETTY_FORMAT: &str = "format:%x1e%H %ct";

/// Incremental parser fed one NUL-delimited record at a time.
#[derive(Debug, Default)]
pub struct LogParser {
    current: Option<HistoryEntry>,
    ready: VecDeque<HistoryEntry>,
}

impl LogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one record, without its NUL terminator.
    ///
    /// Commits completed by a new header become available from `next_ready`.
    pub fn push_record(&mut self, record: &str) -> ChangesResult<()> {
        let mut rest = record;
        loop {
            rest = rest.trim_start_matches('\n');
            if rest.is_empty() {
                return Ok(());
            }

            let Some(after) = rest.strip_prefix(HEADER_MARKER) else {
                return self.push_path(rest.trim_end_matches('\n'));
            };
            let (header, tail) = after.split_once('\n').unwrap_or((after, ""));
            let next = parse_header(header.trim_end())?;
            self.ready.extend(self.current.replace(next));
            rest = tail;
        }
    }

    fn push_path(&mut self, path: &str) -> ChangesResult<()> {
        match self.current.as_mut() {
            Some(entry) => {
                entry.changed_paths.push(path.to_string());
                Ok(())
            }
            None => Err(ChangesError::Message(format!(
                "unexpected path before first commit header in git log output: {path:?}"
            ))),
        }
    }

    /// Next fully collected commit, oldest header first.
    pub fn next_ready(&mut self) -> Option<HistoryEntry> {
        self.ready.pop_front()
    }

    /// Flush everything still held, including the commit being collected.
    pub fn finish(&mut self) -> Option<HistoryEntry> {
        self.ready.pop_front().or_else(|| self.current.take())
    }
}

fn parse_header(header: &str) -> ChangesResult<HistoryEntry> {
    let mut parts = header.split_whitespace();
    let (Some(commit), Some(ts)) = (parts.next(), parts.next()) else {
        return Err(ChangesError::Message(format!(
            "malformed commit header in git log output: {header:?}"
        )));
    };
    let commit_unix_ts = ts.parse::<i64>().map_err(|e| {
        ChangesError::Message(format!("invalid commit timestamp {ts:?} for {commit}: {e}"))
    })?;
    Ok(HistoryEntry {
        commit: commit.to_string(),
        commit_unix_ts,
        changed_paths: Vec::new(),
    })
}

/// Parse a complete NUL-separated log dump.
pub fn parse_log(output: &str) -> ChangesResult<Vec<HistoryEntry>> {
    let mut parser = LogParser::new();
    let mut entries = Vec::new();
    for record in output.split('\0') {
        parser.push_record(record)?;
        entries.extend(std::iter::from_fn(|| parser.next_ready()));
    }
    entries.extend(std::iter::from_fn(|| parser.finish()));
    Ok(entries)
}
