//! Error kinds surfaced by a single invocation.
//!
//! Every failure is terminal: the process reports it on stderr and exits
//! non-zero. The poller owns retry scheduling.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("config {path}: required key `{key}` is missing")]
    ConfigMissing { path: PathBuf, key: &'static str },

    #[error("config {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("cannot build HTTP client: {0}")]
    HttpClient(String),

    #[error("fetch {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    /// `segment` is the first key that could not be followed.
    #[error("path `{path}` not found (no key `{segment}`)")]
    PathNotFound { path: String, segment: String },

    #[error("cannot coerce value as {tag}: {reason}")]
    Coercion { tag: &'static str, reason: String },

    #[error("cannot average an empty series")]
    EmptySeries,

    #[error("unexpected response: {what} is not {expected}")]
    UnexpectedShape {
        what: &'static str,
        expected: &'static str,
    },

    #[error("no cluster node with hostname `{0}`")]
    NodeNotFound(String),

    #[error("unknown type tag `{0}` (expected int, string, avg or string_list)")]
    UnknownTypeTag(String),

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` requires argument <{argument}>")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },

    #[error("{0} is disabled in the configuration")]
    ServiceDisabled(&'static str),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
