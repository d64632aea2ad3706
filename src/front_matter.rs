//! Best-effort title extraction from front matter.
//!
//! Two header styles are recognized, each opened and closed by the same
//! marker line:
//!
//! ```text
//! ---                 +++
//! title: "Guide"      title = "Guide"
//! ---                 +++
//! ```
//!
//! Only a single-line top-level `title` is read. Anything else (no header,
//! unterminated header, unreadable file) yields no title and the caller falls
//! back to the file stem.

use std::path::Path;

use tracing::warn;

/// Front matter flavor, identified by its delimiter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterKind {
    /// `---` delimited, `key: value` lines
    Yaml,
    /// `+++` delimited, `key = value` lines
    Toml,
}

impl FrontMatterKind {
    pub fn from_delimiter(line: &str) -> Option<Self> {
        match line.trim() {
            "---" => Some(FrontMatterKind::Yaml),
            "+++" => Some(FrontMatterKind::Toml),
            _ => None,
        }
    }

    pub fn delimiter(self) -> &'static str {
        match self {
            FrontMatterKind::Yaml => "---",
            FrontMatterKind::Toml => "+++",
        }
    }

    fn separator(self) -> char {
        match self {
            FrontMatterKind::Yaml => ':',
            FrontMatterKind::Toml => '=',
        }
    }

    /// Value of `key` if `line` assigns it at the top level.
    fn top_level_value<'a>(self, line: &'a str, key: &str) -> Option<&'a str> {
        // indented YAML lines belong to a nested mapping
        if self == FrontMatterKind::Yaml && line.starts_with([' ', '\t']) {
            return None;
        }
        let (name, value) = line.split_once(self.separator())?;
        if name.trim() != key {
            return None;
        }
        let value = value.trim();
        if value.is_empty() { None } else { Some(value) }
    }
}

/// Trim and remove one layer of matching `"` or `'` quotes.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Extract the title from file contents.
pub fn extract_title_from_str(text: &str) -> Option<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines();
    let kind = FrontMatterKind::from_delimiter(lines.next()?)?;

    let mut title = None;
    let mut in_table = false;
    for line in lines {
        if line.trim() == kind.delimiter() {
            return title.filter(|t: &String| !t.is_empty());
        }
        if title.is_some() {
            continue;
        }
        if kind == FrontMatterKind::Toml && line.trim_start().starts_with('[') {
            in_table = true;
        }
        if in_table {
            continue;
        }
        if let Some(value) = kind.top_level_value(line, "title") {
            title = Some(strip_quotes(value).to_string());
        }
    }
    // no closing delimiter: not front matter
    None
}

/// Extract the title from a file on disk; unreadable files yield `None`.
pub fn extract_title(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => extract_title_from_str(&text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read content file for title");
            None
        }
    }
}

/// Title for display: front matter title, else the file stem.
pub fn display_title(path: &Path) -> String {
    extract_title(path).unwrap_or_else(|| file_stem(path))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| path.display().to_string())
}
