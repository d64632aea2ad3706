//! Mock backend for testing.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use crate::vcs::traits::{HistoryEntry, HistoryStream, LogQuery, VcsBackend};
use crate::{ChangesError, ChangesResult};

/// In-memory repository with canned history.
///
/// Entries are served in the order given, which callers treat as newest first.
#[derive(Debug, Default)]
pub struct MockBackend {
    /// Root used to resolve content files on disk
    pub root: PathBuf,
    /// History to return from `log`
    pub entries: Vec<HistoryEntry>,
    /// URL returned by `remote_url`
    pub remote: Option<String>,
    /// Whether `log` should fail
    pub log_fails: bool,
    /// Whether `remote_url` should fail
    pub remote_fails: bool,
    log_calls: Cell<usize>,
    entries_served: Cell<usize>,
    last_query: RefCell<Option<LogQuery>>,
}

impl MockBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MockBackend {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Set the history to return.
    pub fn with_entries(mut self, entries: Vec<HistoryEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Set the remote URL to report.
    pub fn with_remote(mut self, url: impl Into<String>) -> Self {
        self.remote = Some(url.into());
        self
    }

    /// Make `log` fail like a broken repository.
    pub fn failing_log(mut self) -> Self {
        self.log_fails = true;
        self
    }

    /// Make `remote_url` fail.
    pub fn failing_remote(mut self) -> Self {
        self.remote_fails = true;
        self
    }

    /// Number of history queries issued so far.
    pub fn log_calls(&self) -> usize {
        self.log_calls.get()
    }

    /// Number of history entries consumers actually pulled.
    pub fn entries_served(&self) -> usize {
        self.entries_served.get()
    }

    /// Query passed to the most recent `log` call.
    pub fn last_query(&self) -> Option<LogQuery> {
        self.last_query.borrow().clone()
    }
}

impl VcsBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn repo_root(&self) -> &Path {
        &self.root
    }

    fn log(&self, query: &LogQuery) -> ChangesResult<HistoryStream<'_>> {
        self.log_calls.set(self.log_calls.get() + 1);
        self.last_query.replace(Some(query.clone()));
        if self.log_fails {
            return Err(ChangesError::HistoryQuery {
                command: "mock log".to_string(),
                stderr: "fatal: not a git repository".to_string(),
            });
        }
        let served = &self.entries_served;
        Ok(Box::new(self.entries.iter().map(
            move |entry| -> ChangesResult<HistoryEntry> {
                served.set(served.get() + 1);
                Ok(entry.clone())
            },
        )))
    }

    fn remote_url(&self, _remote: &str) -> ChangesResult<Option<String>> {
        if self.remote_fails {
            return Err(ChangesError::HistoryQuery {
                command: "mock config".to_string(),
                stderr: "error: could not read config".to_string(),
            });
        }
        Ok(self.remote.clone())
    }
}
