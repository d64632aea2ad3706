pub mod config;
pub mod front_matter;
pub mod recent_cmd;
pub mod remote;
pub mod render;
pub mod select;
pub mod vcs;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChangesError {
    /// A git invocation failed; fatal for the run.
    #[error("git command failed: {command}\n\nstderr:\n{stderr}")]
    HistoryQuery { command: String, stderr: String },
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type ChangesResult<T> = Result<T, ChangesError>;

/// One row of the recent-changes page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Path relative to the repository root, e.g. `content/guide/index.md`
    pub repo_rel_path: String,
    /// Path relative to the content directory, e.g. `guide/index.md`
    pub content_rel_path: String,
    /// Full commit id
    pub commit: String,
    /// Commit time as unix seconds
    pub commit_unix_ts: i64,
    /// Display title, never empty
    pub title: String,
}

impl ChangeRecord {
    pub fn commit_datetime_utc(&self) -> ChangesResult<time::OffsetDateTime> {
        time::OffsetDateTime::from_unix_timestamp(self.commit_unix_ts).map_err(|e| {
            ChangesError::Message(format!(
                "commit {} has out-of-range timestamp {}: {e}",
                self.commit, self.commit_unix_ts
            ))
        })
    }
}

// Shared helpers
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha256::digest;
    digest(bytes)
}

/// Normalize a path-like string to forward slashes.
pub fn to_slash(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_commit_datetime_utc() {
        let record = ChangeRecord {
            repo_rel_path: "content/a.md".to_string(),
            content_rel_path: "a.md".to_string(),
            commit: "deadbeef".to_string(),
            commit_unix_ts: 1_705_320_000,
            title: "A".to_string(),
        };
        let dt = record.commit_datetime_utc().unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_history_query_error_display() {
        let err = ChangesError::HistoryQuery {
            command: "git log".to_string(),
            stderr: "fatal: not a git repository".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("git log"));
        assert!(msg.contains("not a git repository"));
    }
}
