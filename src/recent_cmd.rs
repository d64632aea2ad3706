//! Command handler for generating the recent-changes page.
//!
//! Pipeline: history query -> selection -> titles -> remote links -> page.
//! The history query is the only fatal step; titles and links degrade.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{RecentChangesConfig, resolve_config};
use crate::front_matter::display_title;
use crate::remote::resolve_web_base;
use crate::render::write_page;
use crate::select::list_recent_changed_files;
use crate::vcs::{GitBackend, VcsBackend};
use crate::{ChangeRecord, ChangesError, ChangesResult};

/// Select recent files and turn them into page records.
pub fn build_recent_changes(
    backend: &dyn VcsBackend,
    config: &RecentChangesConfig,
) -> ChangesResult<Vec<ChangeRecord>> {
    let selected = list_recent_changed_files(backend, config)?;
    let prefix = config.content_prefix();
    let root = backend.repo_root();

    let changes = selected
        .into_iter()
        .map(|sel| {
            let title = display_title(&root.join(&sel.path));
            let content_rel_path = sel
                .path
                .strip_prefix(prefix.as_str())
                .unwrap_or(sel.path.as_str())
                .to_string();
            ChangeRecord {
                repo_rel_path: sel.path,
                content_rel_path,
                commit: sel.commit,
                commit_unix_ts: sel.commit_unix_ts,
                title,
            }
        })
        .collect();
    Ok(changes)
}

/// Resolve a repository-relative output path.
fn output_path(root: &Path, output: &Path) -> PathBuf {
    if output.is_absolute() {
        output.to_path_buf()
    } else {
        root.join(output)
    }
}

/// Generate the page for an opened repository; returns the written path.
///
/// Nothing is written when the history query fails.
pub fn run_with_backend(
    backend: &dyn VcsBackend,
    config: &RecentChangesConfig,
    json: Option<&Path>,
) -> ChangesResult<PathBuf> {
    info!(
        backend = backend.name(),
        root = %backend.repo_root().display(),
        count = config.count,
        "collecting recent changes"
    );
    let changes = build_recent_changes(backend, config)?;
    info!("selected {} file(s)", changes.len());

    let web_base = resolve_web_base(backend, &config.remote);
    let out = output_path(backend.repo_root(), &config.output);
    write_page(&out, &changes, web_base.as_deref(), &config.page_title)?;
    info!(path = %out.display(), "wrote page");

    if let Some(json_path) = json {
        write_records_json(&changes, json_path)?;
        info!(path = %json_path.display(), "wrote records json");
    }
    Ok(out)
}

/// Run the generator from the command line.
///
/// # Arguments
/// * `repo` - Any directory inside the repository
/// * `config_path` - Optional TOML config; defaults to `recent-changes.toml` at the root
/// * `json` - Optional path for a JSON dump of the listed changes
pub fn run(repo: PathBuf, config_path: Option<PathBuf>, json: Option<PathBuf>) -> ChangesResult<PathBuf> {
    let backend = GitBackend::discover(&repo)?;
    let config = resolve_config(config_path.as_deref(), backend.repo_root())?;
    run_with_backend(&backend, &config, json.as_deref())
}

fn write_records_json(changes: &[ChangeRecord], path: &Path) -> ChangesResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChangesError::Message(format!("failed to create directory: {e}"))
            })?;
        }
    }
    let json = serde_json::to_string_pretty(changes)
        .map_err(|e| ChangesError::Message(format!("failed to serialize records: {e}")))?;
    std::fs::write(path, json + "\n")
        .map_err(|e| ChangesError::Message(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}
