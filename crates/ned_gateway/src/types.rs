use std::path::PathBuf;

use thiserror::Error;

/// One discoverable dataset entry scanned out of gateway HTML.
///
/// Immutable once emitted by the scanner; consumed once by the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// Raw `onclick` payload. A script trigger, not directly fetchable.
    pub placeholder: String,
    /// Free-text product description inherited from the nearest preceding
    /// table row.
    pub category: String,
    /// Trimmed display name, e.g. `n40w105`. May be empty.
    pub name: String,
}

/// Result of one scanner pass over a gateway document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanOutput {
    pub candidates: Vec<LinkCandidate>,
    /// Set when the page title signalled "Object moved" and a following
    /// anchor carried the replay target.
    pub redirect_target: Option<String>,
}

/// Final output of the query/replay protocol. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Bracketed session id, `(S(...))`. Empty when no redirect was replayed.
    pub token: String,
    pub candidates: Vec<LinkCandidate>,
}

/// A filtered candidate rewritten into a navigable placeholder URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDownload {
    pub name: String,
    /// Session-scoped URL for the render surface to navigate to.
    pub placeholder_url: String,
    pub output_dir: PathBuf,
    /// Archive filename derived from the candidate name; `None` when the
    /// name was empty, in which case the signed URL decides.
    pub file_name: Option<String>,
}

/// A candidate whose handshake completed with a real signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDownload {
    pub name: String,
    /// Time-limited, directly fetchable URL returned by the handshake.
    pub signed_url: String,
    pub output_path: PathBuf,
}

/// One unit of work for the download pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The output path already existed; nothing was fetched.
    Skipped,
    Downloaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: DownloadTask,
    pub outcome: TaskOutcome,
}

/// Transport-level failure. Not retried; the run aborts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

/// Failure of the page-render capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("render surface produced no further completions")]
    Closed,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The redirect contract changed: an "Object moved" page whose target
    /// carries no `(S(...))` session id.
    #[error("session redirect without a session id: {url}")]
    Protocol { url: String },
    /// The query succeeded but produced zero candidates. Most likely the
    /// bounding box is off or the page layout no longer matches.
    #[error("query returned no link candidates")]
    NoResults,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("output directory unusable: {0}")]
    OutputDir(String),
}
