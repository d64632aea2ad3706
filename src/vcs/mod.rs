//! Version-control access.
//!
//! - `traits`: the `VcsBackend` seam and the `HistoryEntry` / `LogQuery` types.
//! - `log`: parser for the `git log --name-only` output format.
//! - `git`: the real backend, shelling out to the `git` binary.
//! - `mock`: an in-memory backend for tests.

pub mod git;
pub mod log;
pub mod mock;
pub mod traits;

pub use git::GitBackend;
pub use log::{HEADER_MARKER, LogParser, PRETTY_FORMAT, parse_log};
pub use mock::MockBackend;
pub use traits::{HistoryEntry, HistoryStream, LogQuery, VcsBackend};
