//! Recent-changes page generator.
//!
//! Emits a Hugo-style markdown page: YAML front matter, a heading and one
//! table row per change. Output depends only on its inputs, so unchanged
//! history renders byte-identical pages.

use std::fs;
use std::path::Path;

use time::macros::format_description;

use crate::remote::{commit_file_diff_url, commit_url};
use crate::{ChangeRecord, ChangesError, ChangesResult};

/// Front matter weight placing the page last in menus.
pub const PAGE_WEIGHT: u32 = 99;

/// Length of the commit id shown when no web links are available.
pub const SHORT_COMMIT_LEN: usize = 10;

/// Format a unix timestamp as `YYYY-MM-DD HH:MM UTC`.
pub fn format_when(record: &ChangeRecord) -> ChangesResult<String> {
    let when = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
    record
        .commit_datetime_utc()?
        .format(when)
        .map_err(|e| ChangesError::Message(format!("failed to format commit time: {e}")))
}

/// Escape characters that would break a table cell or link text.
fn escape_cell(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '|' | '[' | ']' => {
                result.push('\\');
                result.push(c);
            }
            '\n' | '\r' => result.push(' '),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a path for a double-quoted shortcode argument.
///
/// Hugo swaps shortcodes for placeholders before the table is parsed, so
/// only the closing quote needs protecting; a backslash escape is honored
/// there only in front of `"`.
fn escape_shortcode_arg(s: &str) -> String {
    s.replace('"', "\\\"")
}

/// Escape a value for a double-quoted YAML scalar.
fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Git cell: diff and commit links, or the short commit id.
pub fn git_cell(record: &ChangeRecord, web_base: Option<&str>) -> String {
    match web_base {
        Some(base) => format!(
            "[diff]({}) · [commit]({})",
            commit_file_diff_url(base, &record.commit, &record.repo_rel_path),
            commit_url(base, &record.commit),
        ),
        None => record.commit.chars().take(SHORT_COMMIT_LEN).collect(),
    }
}

/// Page cell: the title linked through a `relref` shortcode.
pub fn page_cell(record: &ChangeRecord) -> String {
    format!(
        "[{}]({{{{< relref \"{}\" >}}}})",
        escape_cell(&record.title),
        escape_shortcode_arg(&record.content_rel_path)
    )
}

/// Render the complete page.
pub fn render_page(
    changes: &[ChangeRecord],
    web_base: Option<&str>,
    page_title: &str,
) -> ChangesResult<String> {
    let mut lines: Vec<String> = vec![
        "---".to_string(),
        format!("title: \"{}\"", escape_yaml_string(page_title)),
        format!("weight: {PAGE_WEIGHT}"),
        "---".to_string(),
        String::new(),
        format!("# {page_title}"),
        String::new(),
        "| When | Page | Git |".to_string(),
        "|---|---|---|".to_string(),
    ];

    for change in changes {
        lines.push(format!(
            "| {} | {} | {} |",
            format_when(change)?,
            page_cell(change),
            git_cell(change, web_base)
        ));
    }

    lines.push(String::new());
    Ok(lines.join("\n"))
}

/// Render and write the page, replacing any existing file.
pub fn write_page(
    path: &Path,
    changes: &[ChangeRecord],
    web_base: Option<&str>,
    page_title: &str,
) -> ChangesResult<()> {
    let page = render_page(changes, web_base, page_title)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                ChangesError::Message(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    fs::write(path, page).map_err(|e| {
        ChangesError::Message(format!("failed to write {}: {e}", path.display()))
    })?;
    Ok(())
}
