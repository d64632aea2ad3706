//! Git backend.
//!
//! Shells out to the `git` CLI (no libgit2). Every invocation runs as
//! `git -C <repo_root> ...` so the process working directory never matters.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Output, Stdio};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::vcs::log::{LogParser, PRETTY_FORMAT};
use crate::vcs::traits::{HistoryEntry, HistoryStream, LogQuery, VcsBackend};
use crate::{ChangesError, ChangesResult};

/// Repository accessed through the `git` binary.
#[derive(Debug, Clone)]
pub struct GitBackend {
    repo_root: PathBuf,
    /// Path to the git binary (default: "git" from PATH)
    git_path: PathBuf,
}

impl GitBackend {
    /// Open the repository containing `start`.
    ///
    /// Runs `git rev-parse --show-toplevel`; fails with `HistoryQuery` outside
    /// a work tree or when git is missing.
    pub fn discover(start: &Path) -> ChangesResult<Self> {
        Self::discover_with_git(start, PathBuf::from("git"))
    }

    /// Like `discover`, using a specific git binary.
    pub fn discover_with_git(start: &Path, git_path: impl Into<PathBuf>) -> ChangesResult<Self> {
        let probe = GitBackend {
            repo_root: start.to_path_buf(),
            git_path: git_path.into(),
        };
        let top = probe.run(&["rev-parse", "--show-toplevel"])?;
        let top = top.trim();
        if top.is_empty() {
            return Err(ChangesError::Message(format!(
                "git reported an empty top-level directory for {}",
                start.display()
            )));
        }
        Ok(GitBackend {
            repo_root: PathBuf::from(top),
            git_path: probe.git_path,
        })
    }

    /// Use an already known repository root without probing it.
    pub fn at_root(repo_root: impl Into<PathBuf>) -> Self {
        GitBackend {
            repo_root: repo_root.into(),
            git_path: PathBuf::from("git"),
        }
    }

    /// Get the path to the git binary.
    pub fn git_path(&self) -> &Path {
        &self.git_path
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.arg("-C").arg(&self.repo_root).args(args);
        cmd
    }

    /// Shell-quoted rendering of `git <args>` for error messages.
    fn display_command(&self, args: &[&str]) -> String {
        let git = self.git_path.to_string_lossy();
        let words = std::iter::once(git.as_ref()).chain(args.iter().copied());
        shlex::try_join(words.clone())
            .unwrap_or_else(|_| words.collect::<Vec<_>>().join(" "))
    }

    fn output(&self, args: &[&str]) -> ChangesResult<Output> {
        debug!(command = %self.display_command(args), "running git");
        self.command(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ChangesError::HistoryQuery {
                command: self.display_command(args),
                stderr: format!("failed to start git: {e}"),
            })
    }

    /// Run git and return stdout, failing on a non-zero exit.
    fn run(&self, args: &[&str]) -> ChangesResult<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(ChangesError::HistoryQuery {
                command: self.display_command(args),
                stderr: describe_failure(&output.stderr, output.status),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn describe_failure(stderr: &[u8], status: std::process::ExitStatus) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim_end();
    if text.is_empty() {
        format!("(no output, {status})")
    } else {
        text.to_string()
    }
}

impl VcsBackend for GitBackend {
    fn name(&self) -> &'static str {
        "git"
    }

    fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn log(&self, query: &LogQuery) -> ChangesResult<HistoryStream<'_>> {
        let pretty = format!("--pretty={PRETTY_FORMAT}");
        let diff_filter = format!("--diff-filter={}", query.diff_filter);
        let pathspec = if query.content_dir.is_empty() {
            "."
        } else {
            query.content_dir.as_str()
        };
        let args = [
            "-c",
            "core.quotepath=off",
            "log",
            "-z",
            pretty.as_str(),
            "--name-only",
            diff_filter.as_str(),
            "--",
            pathspec,
        ];
        let command = self.display_command(&args);
        debug!(%command, "starting history query");

        let mut child = self
            .command(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ChangesError::HistoryQuery {
                command: command.clone(),
                stderr: format!("failed to start git: {e}"),
            })?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ChangesError::HistoryQuery {
                command,
                stderr: "git stdout was not captured".to_string(),
            });
        };
        // Drained concurrently so a chatty git never blocks on a full pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut collected = Vec::new();
                let _ = pipe.read_to_end(&mut collected);
                collected
            })
        });

        Ok(Box::new(GitLogStream {
            child,
            stdout: BufReader::new(stdout),
            stderr_reader,
            buf: Vec::new(),
            parser: LogParser::new(),
            command,
            done: false,
            reaped: false,
        }))
    }

    fn remote_url(&self, remote: &str) -> ChangesResult<Option<String>> {
        let key = format!("remote.{remote}.url");
        let args = ["config", "--get", key.as_str()];
        let output = self.output(&args)?;
        // `git config --get` exits with 1 when the key is unset
        if output.status.code() == Some(1) && output.stderr.is_empty() {
            return Ok(None);
        }
        if !output.status.success() {
            return Err(ChangesError::HistoryQuery {
                command: self.display_command(&args),
                stderr: describe_failure(&output.stderr, output.status),
            });
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if url.is_empty() { None } else { Some(url) })
    }
}

/// Streaming reader over a running `git log`.
///
/// Commits are parsed as stdout arrives. The exit status is checked once
/// stdout is exhausted, before the last commit is handed out; dropping the
/// stream early kills the process.
struct GitLogStream {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_reader: Option<JoinHandle<Vec<u8>>>,
    buf: Vec<u8>,
    parser: LogParser,
    command: String,
    done: bool,
    reaped: bool,
}

impl GitLogStream {
    fn wait_success(&mut self) -> ChangesResult<()> {
        let status = self.child.wait().map_err(|e| ChangesError::HistoryQuery {
            command: self.command.clone(),
            stderr: format!("failed to wait for git: {e}"),
        })?;
        self.reaped = true;
        let stderr = self
            .stderr_reader
            .take()
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        if status.success() {
            return Ok(());
        }
        Err(ChangesError::HistoryQuery {
            command: self.command.clone(),
            stderr: describe_failure(&stderr, status),
        })
    }

    /// Stop yielding; anything still buffered is discarded.
    fn abort(&mut self, err: ChangesError) -> Option<ChangesResult<HistoryEntry>> {
        self.done = true;
        self.parser = LogParser::new();
        Some(Err(err))
    }
}

impl Iterator for GitLogStream {
    type Item = ChangesResult<HistoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.parser.next_ready() {
                return Some(Ok(entry));
            }
            if self.done {
                return self.parser.finish().map(Ok);
            }
            self.buf.clear();
            match self.stdout.read_until(b'\0', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    if let Err(e) = self.wait_success() {
                        return self.abort(e);
                    }
                }
                Ok(_) => {
                    if self.buf.last() == Some(&0) {
                        self.buf.pop();
                    }
                    let pushed = self
                        .parser
                        .push_record(&String::from_utf8_lossy(&self.buf));
                    if let Err(e) = pushed {
                        return self.abort(e);
                    }
                }
                Err(e) => {
                    let err = ChangesError::HistoryQuery {
                        command: self.command.clone(),
                        stderr: format!("failed to read git output: {e}"),
                    };
                    return self.abort(err);
                }
            }
        }
    }
}

impl Drop for GitLogStream {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
