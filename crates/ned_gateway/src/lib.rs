//! Gateway pipeline for bulk elevation downloads: query, scan, session
//! replay, per-item handshake, bounded-concurrency fetch.
mod decode;
mod download;
mod fetch;
mod filename;
mod filter;
mod normalize;
mod render;
mod resolve;
mod scan;
mod session;
mod types;

pub use decode::decode_page;
pub use download::{ensure_output_dir, DownloadPool, DownloadSettings};
pub use fetch::{FetchSettings, Fetcher, PageBytes, ReqwestFetcher};
pub use filename::{candidate_filename, signed_url_filename};
pub use filter::{select_downloads, DatasetFormat};
pub use normalize::{normalize, normalize_replay};
pub use render::{HttpRenderer, PageRenderer};
pub use resolve::{find_signed_url, resolve_and_download, ResolveSettings};
pub use scan::scan_results_page;
pub use session::{extract_session_token, resolve_session, BoundingBox, GatewaySettings};
pub use types::{
    DownloadTask, FetchError, GatewayError, LinkCandidate, PendingDownload, RenderError,
    ResolvedDownload, ScanOutput, SessionContext, TaskOutcome, TaskReport,
};
