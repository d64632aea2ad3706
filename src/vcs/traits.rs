//! Backend trait and history types shared by the real and mock backends.

use std::path::Path;

use crate::ChangesResult;
use crate::config::DiffFilter;

/// One commit from the history query, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Full commit id
    pub commit: String,
    /// Commit time as unix seconds
    pub commit_unix_ts: i64,
    /// Changed paths in the order the backend listed them
    pub changed_paths: Vec<String>,
}

impl HistoryEntry {
    pub fn new(commit: impl Into<String>, commit_unix_ts: i64, changed_paths: &[&str]) -> Self {
        HistoryEntry {
            commit: commit.into(),
            commit_unix_ts,
            changed_paths: changed_paths.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Parameters of a history query.
#[derive(Debug, Clone)]
pub struct LogQuery {
    /// Repository-relative directory the log is restricted to
    pub content_dir: String,
    pub diff_filter: DiffFilter,
}

/// Lazily produced history, newest commit first.
///
/// Dropping the stream early abandons the rest of the query.
pub type HistoryStream<'a> = Box<dyn Iterator<Item = ChangesResult<HistoryEntry>> + 'a>;

/// Access to a version-controlled repository.
pub trait VcsBackend {
    /// Backend name (e.g., "git").
    fn name(&self) -> &'static str;

    /// Top-level directory of the working tree.
    fn repo_root(&self) -> &Path;

    /// Start the ordered history query.
    ///
    /// Errors from the underlying tool surface as `ChangesError::HistoryQuery`,
    /// either here or as an item of the stream.
    fn log(&self, query: &LogQuery) -> ChangesResult<HistoryStream<'_>>;

    /// URL configured for `remote`, `None` if the remote is not set.
    fn remote_url(&self, remote: &str) -> ChangesResult<Option<String>>;
}
