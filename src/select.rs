//! Recent-file selection over the commit history.
//!
//! A single newest-first pass keeps the first qualifying occurrence of each
//! path and stops as soon as `count` distinct paths are collected, so only as
//! much history is read as needed.

use std::collections::HashSet;

use tracing::debug;

use crate::ChangesResult;
use crate::config::RecentChangesConfig;
use crate::vcs::{HistoryEntry, LogQuery, VcsBackend};

/// A path picked from history with the newest commit that touched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPath {
    pub path: String,
    pub commit: String,
    pub commit_unix_ts: i64,
}

/// Inclusion and exclusion rules for candidate paths.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    /// Required prefix, e.g. `content/`; empty accepts any path
    pub prefix: String,
    /// Required suffix, e.g. `.md`; empty accepts any path
    pub extension: String,
    pub exclude_exact: HashSet<String>,
    pub exclude_prefixes: Vec<String>,
}

impl PathFilter {
    pub fn from_config(config: &RecentChangesConfig) -> Self {
        PathFilter {
            prefix: config.content_prefix(),
            extension: config.extension.clone(),
            exclude_exact: config.effective_exclude_exact().into_iter().collect(),
            exclude_prefixes: config
                .exclude_prefixes
                .iter()
                .map(|p| crate::to_slash(p))
                .collect(),
        }
    }

    /// Whether `path` is eligible, ignoring duplicates.
    pub fn accepts(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
            && (self.extension.is_empty() || path.ends_with(&self.extension))
            && !self.exclude_exact.contains(path)
            && !self
                .exclude_prefixes
                .iter()
                .any(|pfx| path.starts_with(pfx.as_str()))
    }
}

/// Pick up to `count` distinct qualifying paths from newest-first history.
///
/// Paths within one commit keep the order the backend listed them in. The
/// input is not consumed past the entry that completes the selection.
pub fn select_recent<I>(
    entries: I,
    filter: &PathFilter,
    count: usize,
) -> ChangesResult<Vec<SelectedPath>>
where
    I: IntoIterator<Item = ChangesResult<HistoryEntry>>,
{
    let mut selected = Vec::new();
    if count == 0 {
        return Ok(selected);
    }
    let mut seen: HashSet<String> = HashSet::new();

    for entry in entries {
        let entry = entry?;
        for path in &entry.changed_paths {
            if !filter.accepts(path) || seen.contains(path) {
                continue;
            }
            debug!(%path, commit = %entry.commit, "selected");
            seen.insert(path.clone());
            selected.push(SelectedPath {
                path: path.clone(),
                commit: entry.commit.clone(),
                commit_unix_ts: entry.commit_unix_ts,
            });
            if selected.len() >= count {
                return Ok(selected);
            }
        }
    }
    Ok(selected)
}

/// Query history and select the most recently touched content files.
///
/// With a zero count no history query is issued.
pub fn list_recent_changed_files(
    backend: &dyn VcsBackend,
    config: &RecentChangesConfig,
) -> ChangesResult<Vec<SelectedPath>> {
    if config.count == 0 {
        return Ok(Vec::new());
    }
    let query = LogQuery {
        content_dir: config.normalized_content_dir(),
        diff_filter: config.diff_filter.clone(),
    };
    let filter = PathFilter::from_config(config);
    let stream = backend.log(&query)?;
    select_recent(stream, &filter, config.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChangesError;

    fn ok(entries: Vec<HistoryEntry>) -> Vec<ChangesResult<HistoryEntry>> {
        entries.into_iter().map(Ok).collect()
    }

    fn default_filter() -> PathFilter {
        PathFilter::from_config(&RecentChangesConfig::default())
    }

    fn paths(selected: &[SelectedPath]) -> Vec<&str> {
        selected.iter().map(|s| s.path.as_str()).collect()
    }

    #[test]
    fn test_newest_occurrence_wins() {
        let history = ok(vec![
            HistoryEntry::new("c3", 300, &["content/a.md"]),
            HistoryEntry::new("c2", 200, &["content/b.md"]),
            HistoryEntry::new("c1", 100, &["content/a.md"]),
        ]);
        let selected = select_recent(history, &default_filter(), 2).unwrap();
        assert_eq!(
            selected,
            vec![
                SelectedPath {
                    path: "content/a.md".to_string(),
                    commit: "c3".to_string(),
                    commit_unix_ts: 300,
                },
                SelectedPath {
                    path: "content/b.md".to_string(),
                    commit: "c2".to_string(),
                    commit_unix_ts: 200,
                },
            ]
        );
    }

    #[test]
    fn test_duplicates_never_repeat() {
        let history = ok(vec![
            HistoryEntry::new("c4", 400, &["content/a.md", "content/a.md"]),
            HistoryEntry::new("c3", 300, &["content/a.md"]),
            HistoryEntry::new("c2", 200, &["content/a.md", "content/b.md"]),
        ]);
        let selected = select_recent(history, &default_filter(), 10).unwrap();
        assert_eq!(paths(&selected), vec!["content/a.md", "content/b.md"]);
        assert_eq!(selected[1].commit, "c2");
    }

    #[test]
    fn test_same_commit_keeps_backend_order() {
        let history = ok(vec![HistoryEntry::new(
            "c1",
            100,
            &["content/z.md", "content/a.md", "content/m.md"],
        )]);
        let selected = select_recent(history, &default_filter(), 10).unwrap();
        assert_eq!(
            paths(&selected),
            vec!["content/z.md", "content/a.md", "content/m.md"]
        );
    }

    #[test]
    fn test_filters_prefix_extension_and_exclusions() {
        let history = ok(vec![HistoryEntry::new(
            "c1",
            100,
            &[
                "content/recent-changes.md",
                "content/posts/2024/hello.md",
                "content/guide/image.png",
                "static/readme.md",
                "contentious.md",
                "content/guide/index.md",
            ],
        )]);
        let selected = select_recent(history, &default_filter(), 10).unwrap();
        assert_eq!(paths(&selected), vec!["content/guide/index.md"]);
    }

    #[test]
    fn test_empty_extension_accepts_any_file() {
        let filter = PathFilter {
            prefix: "content/".to_string(),
            ..Default::default()
        };
        assert!(filter.accepts("content/logo.svg"));
        assert!(!filter.accepts("static/logo.svg"));
    }

    #[test]
    fn test_stops_pulling_history_once_full() {
        let mut pulled = 0;
        let history = (0..100).map(|i| {
            pulled += 1;
            Ok::<_, ChangesError>(HistoryEntry {
                commit: format!("c{i}"),
                commit_unix_ts: 1000 - i,
                changed_paths: vec![format!("content/page{i}.md")],
            })
        });
        let selected = select_recent(history, &default_filter(), 3).unwrap();
        assert_eq!(selected.len(), 3);
        assert_eq!(pulled, 3);
    }

    #[test]
    fn test_zero_count_is_empty() {
        let history = ok(vec![HistoryEntry::new("c1", 100, &["content/a.md"])]);
        assert!(select_recent(history, &default_filter(), 0).unwrap().is_empty());
    }

    #[test]
    fn test_stream_error_propagates() {
        let history: Vec<ChangesResult<HistoryEntry>> = vec![
            Ok(HistoryEntry::new("c2", 200, &["content/a.md"])),
            Err(ChangesError::HistoryQuery {
                command: "git log".to_string(),
                stderr: "fatal: bad object".to_string(),
            }),
        ];
        let err = select_recent(history, &default_filter(), 5).unwrap_err();
        assert!(matches!(err, ChangesError::HistoryQuery { .. }));
    }

    #[test]
    fn test_moved_output_page_never_lists_itself() {
        let config = RecentChangesConfig {
            output: "content/whats-new.md".into(),
            ..Default::default()
        };
        let history = ok(vec![HistoryEntry::new(
            "c1",
            100,
            &["content/whats-new.md", "content/guide.md"],
        )]);
        let selected = select_recent(history, &PathFilter::from_config(&config), 10).unwrap();
        assert_eq!(paths(&selected), vec!["content/guide.md"]);
    }

    #[test]
    fn test_filter_normalizes_backslash_exclusions() {
        let config = RecentChangesConfig {
            exclude_prefixes: vec!["content\\drafts\\".to_string()],
            ..Default::default()
        };
        let filter = PathFilter::from_config(&config);
        assert!(!filter.accepts("content/drafts/wip.md"));
        assert!(filter.accepts("content/guide.md"));
    }
}
