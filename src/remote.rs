//! Web links for the repository's hosting provider.
//!
//! The configured remote URL is matched against an ordered list of shapes;
//! the first match is normalized to `https://host/OWNER/REPO`. Anything that
//! does not match leaves the page in plain commit-id mode.

use tracing::{debug, warn};

use crate::vcs::VcsBackend;

/// A remote URL shape and how to normalize it.
type RemoteRule = fn(&str) -> Option<String>;

/// Rules in evaluation order.
const RULES: &[(&str, RemoteRule)] = &[
    ("https", match_http),
    ("scp-ssh", match_scp_ssh),
    ("ssh-url", match_ssh_url),
];

/// Normalize a remote URL to a web base URL, `None` if the shape is unknown.
pub fn web_base_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    RULES.iter().find_map(|(name, rule)| {
        let base = rule(url)?;
        debug!(rule = *name, %base, "matched remote url");
        Some(base)
    })
}

/// Resolve the web base URL of `remote`.
///
/// A missing remote, a failed lookup and an unrecognized URL all give `None`.
pub fn resolve_web_base(backend: &dyn VcsBackend, remote: &str) -> Option<String> {
    let url = match backend.remote_url(remote) {
        Ok(Some(url)) => url,
        Ok(None) => {
            debug!(remote, "no remote configured");
            return None;
        }
        Err(e) => {
            warn!(remote, error = %e, "cannot read remote url; links disabled");
            return None;
        }
    };
    let base = web_base_from_url(&url);
    if base.is_none() {
        warn!(remote, %url, "unrecognized remote url; links disabled");
    }
    base
}

/// `http[s]://host/OWNER/REPO[.git][/]`
fn match_http(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let (host, path) = rest.split_once('/')?;
    owner_repo_base(host, path.strip_suffix('/').unwrap_or(path))
}

/// `user@host:OWNER/REPO[.git]`
fn match_scp_ssh(url: &str) -> Option<String> {
    if url.contains("://") {
        return None;
    }
    let (user_host, path) = url.split_once(':')?;
    let (user, host) = user_host.split_once('@')?;
    if user.is_empty() {
        return None;
    }
    owner_repo_base(host, path)
}

/// `ssh://[user@]host[:port]/OWNER/REPO[.git][/]`
fn match_ssh_url(url: &str) -> Option<String> {
    let rest = url.strip_prefix("ssh://")?;
    let (authority, path) = rest.split_once('/')?;
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = host.split_once(':').map_or(host, |(h, _)| h);
    owner_repo_base(host, path.strip_suffix('/').unwrap_or(path))
}

/// Build `https://host/OWNER/REPO` from a host and an `OWNER/REPO[.git]` path.
fn owner_repo_base(host: &str, path: &str) -> Option<String> {
    if host.is_empty() || host.contains(['@', '/']) {
        return None;
    }
    let (owner, repo) = path.split_once('/')?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if !valid_segment(owner) || !valid_segment(repo) {
        return None;
    }
    Some(format!("https://{host}/{owner}/{repo}"))
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(['/', ':', '@']) && !segment.contains(char::is_whitespace)
}

/// Link to a commit page.
pub fn commit_url(web_base: &str, commit: &str) -> String {
    format!("{web_base}/commit/{commit}")
}

/// Link to one file's diff within a commit page.
///
/// The anchor is `diff-<sha256 hex of the repository-relative path>`.
pub fn commit_file_diff_url(web_base: &str, commit: &str, repo_rel_path: &str) -> String {
    let anchor = crate::sha256_hex(repo_rel_path.as_bytes());
    format!("{web_base}/commit/{commit}#diff-{anchor}")
}
