use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::{ChangesError, ChangesResult};

/// Default config file looked up at the repository root.
pub const DEFAULT_CONFIG_FILE: &str = "recent-changes.toml";

/// Change-type letters accepted by `git log --diff-filter`.
const DIFF_FILTER_LETTERS: &str = "ACDMRTUXB";

/// Validated value for `git log --diff-filter`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct DiffFilter(String);

impl DiffFilter {
    pub fn new(letters: impl Into<String>) -> ChangesResult<Self> {
        let letters = letters.into();
        if letters.is_empty() {
            return Err(ChangesError::Message("diff filter must not be empty".into()));
        }
        if let Some(bad) = letters.chars().find(|c| !DIFF_FILTER_LETTERS.contains(*c)) {
            return Err(ChangesError::Message(format!(
                "invalid diff filter letter '{bad}' in \"{letters}\" (expected any of {DIFF_FILTER_LETTERS})"
            )));
        }
        Ok(DiffFilter(letters))
    }

    /// Additions and modifications; pure deletions are skipped.
    pub fn added_or_modified() -> Self {
        DiffFilter("AM".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DiffFilter {
    fn default() -> Self {
        Self::added_or_modified()
    }
}

impl TryFrom<String> for DiffFilter {
    type Error = ChangesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DiffFilter::new(value)
    }
}

impl fmt::Display for DiffFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Settings for one recent-changes run.
///
/// All paths are repository-relative with forward slashes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecentChangesConfig {
    /// Number of distinct files to list
    pub count: usize,
    /// Directory holding the site content
    pub content_dir: String,
    /// Extension of content files, including the dot; empty matches everything
    pub extension: String,
    pub diff_filter: DiffFilter,
    /// Paths never listed; unset means just the output page
    pub exclude_exact: Option<Vec<String>>,
    /// Path prefixes never listed
    pub exclude_prefixes: Vec<String>,
    /// Where the page is written
    pub output: PathBuf,
    pub page_title: String,
    /// Remote whose URL is turned into commit links
    pub remote: String,
}

impl Default for RecentChangesConfig {
    fn default() -> Self {
        RecentChangesConfig {
            count: 25,
            content_dir: "content".to_string(),
            extension: ".md".to_string(),
            diff_filter: DiffFilter::default(),
            exclude_exact: None,
            exclude_prefixes: vec!["content/posts/".to_string()],
            output: PathBuf::from("content/recent-changes.md"),
            page_title: "Recent Changes".to_string(),
            remote: "origin".to_string(),
        }
    }
}

impl RecentChangesConfig {
    /// Content directory without surrounding slashes, e.g. `content`.
    pub fn normalized_content_dir(&self) -> String {
        crate::to_slash(&self.content_dir)
            .trim_matches('/')
            .to_string()
    }

    /// Exact paths never listed.
    ///
    /// Without an explicit list this is the output page, as long as `output`
    /// is repository-relative.
    pub fn effective_exclude_exact(&self) -> Vec<String> {
        match &self.exclude_exact {
            Some(paths) => paths.iter().map(|p| crate::to_slash(p)).collect(),
            None if self.output.is_relative() => {
                let out = crate::to_slash(&self.output.to_string_lossy());
                vec![out.trim_start_matches("./").to_string()]
            }
            None => Vec::new(),
        }
    }

    /// Prefix every listed path must start with, e.g. `content/`.
    pub fn content_prefix(&self) -> String {
        let dir = self.normalized_content_dir();
        if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        }
    }
}

pub fn load_config(path: &Path) -> ChangesResult<RecentChangesConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: RecentChangesConfig =
        toml::from_str(&s).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Resolve the effective config for a repository.
///
/// An explicit path must exist. Otherwise `recent-changes.toml` at the
/// repository root is used when present, else the defaults.
pub fn resolve_config(
    explicit: Option<&Path>,
    repo_root: &Path,
) -> ChangesResult<RecentChangesConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let candidate = repo_root.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        tracing::debug!(path = %candidate.display(), "loading config");
        load_config(&candidate)
    } else {
        Ok(RecentChangesConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = RecentChangesConfig::default();
        assert_eq!(cfg.count, 25);
        assert_eq!(cfg.content_prefix(), "content/");
        assert_eq!(cfg.diff_filter.as_str(), "AM");
        assert_eq!(cfg.exclude_exact, None);
        assert_eq!(cfg.effective_exclude_exact(), vec!["content/recent-changes.md"]);
        assert_eq!(cfg.exclude_prefixes, vec!["content/posts/"]);
    }

    #[test]
    fn test_content_prefix_normalization() {
        let cfg = RecentChangesConfig {
            content_dir: "\\docs\\content\\".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.normalized_content_dir(), "docs/content");
        assert_eq!(cfg.content_prefix(), "docs/content/");

        let root = RecentChangesConfig {
            content_dir: "/".to_string(),
            ..Default::default()
        };
        assert_eq!(root.content_prefix(), "");
    }

    #[test]
    fn test_exclusion_follows_overridden_output() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("recent-changes.toml");
        std::fs::write(&path, "output = \"./content/whats-new.md\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.effective_exclude_exact(), vec!["content/whats-new.md"]);

        std::fs::write(
            &path,
            "output = \"content/whats-new.md\"\nexclude_exact = [\"content\\\\legal.md\"]\n",
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.effective_exclude_exact(), vec!["content/legal.md"]);

        let absolute = RecentChangesConfig {
            output: std::env::temp_dir().join("recent-changes.md"),
            ..Default::default()
        };
        assert!(absolute.effective_exclude_exact().is_empty());
    }

    #[test]
    fn test_diff_filter_validation() {
        assert!(DiffFilter::new("AM").is_ok());
        assert!(DiffFilter::new("AMR").is_ok());
        assert!(DiffFilter::new("").is_err());
        let err = DiffFilter::new("AZ").unwrap_err();
        assert!(err.to_string().contains("'Z'"));
    }

    #[test]
    fn test_load_partial_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("recent-changes.toml");
        std::fs::write(
            &path,
            "count = 5\nexclude_prefixes = [\"content/blog/\", \"content/drafts/\"]\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.count, 5);
        assert_eq!(cfg.exclude_prefixes.len(), 2);
        // untouched keys keep their defaults
        assert_eq!(cfg.content_dir, "content");
        assert_eq!(cfg.page_title, "Recent Changes");
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let temp = TempDir::new().unwrap();
        let bad_filter = temp.path().join("bad_filter.toml");
        std::fs::write(&bad_filter, "diff_filter = \"Q\"\n").unwrap();
        assert!(load_config(&bad_filter).is_err());

        let unknown = temp.path().join("unknown.toml");
        std::fs::write(&unknown, "colour = \"blue\"\n").unwrap();
        assert!(load_config(&unknown).is_err());
    }

    #[test]
    fn test_resolve_config_fallbacks() {
        let temp = TempDir::new().unwrap();
        let cfg = resolve_config(None, temp.path()).unwrap();
        assert_eq!(cfg, RecentChangesConfig::default());

        std::fs::write(temp.path().join(DEFAULT_CONFIG_FILE), "count = 3\n").unwrap();
        let cfg = resolve_config(None, temp.path()).unwrap();
        assert_eq!(cfg.count, 3);

        let missing = temp.path().join("missing.toml");
        let err = resolve_config(Some(&missing), temp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }
}
