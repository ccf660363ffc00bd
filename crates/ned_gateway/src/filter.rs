use std::collections::HashSet;
use std::path::Path;

use log::{debug, warn};

use crate::filename::candidate_filename;
use crate::types::{LinkCandidate, PendingDownload};

/// The four pre-packaged dataset variants the gateway lists for an elevation
/// query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    ArcGridOneArcSecond,
    ArcGridThirdArcSecond,
    FloatOneArcSecond,
    FloatThirdArcSecond,
}

impl DatasetFormat {
    /// Row label exactly as the gateway prints it. Matching is by equality;
    /// a reworded label upstream silently matches nothing.
    pub fn row_label(self) -> &'static str {
        match self {
            DatasetFormat::ArcGridOneArcSecond => {
                "National Elevation Dataset (1 arc second) Pre-packaged ArcGrid format"
            }
            DatasetFormat::ArcGridThirdArcSecond => {
                "National Elevation Dataset (1/3 arc second) Pre-packaged ArcGrid format"
            }
            DatasetFormat::FloatOneArcSecond => {
                "National Elevation Dataset (1 arc second) Pre-packaged Float format"
            }
            DatasetFormat::FloatThirdArcSecond => {
                "National Elevation Dataset (1/3 arc second) Pre-packaged Float format"
            }
        }
    }
}

const SCRIPT_PREFIX: &str = "window.open('";
const SCRIPT_SUFFIX: &str =
    "','downloadWin','left=100,top=100,width=600,height=500'); return false;";

/// Rewrites a raw `onclick` payload into a session-scoped gateway path.
fn placeholder_path(raw: &str, token: &str) -> Option<String> {
    let stripped = raw.strip_prefix(SCRIPT_PREFIX)?;
    let path = match stripped.strip_suffix(SCRIPT_SUFFIX) {
        Some(path) => path,
        // Window geometry has changed before; fall back to cutting at the
        // first script argument separator.
        None => stripped.split("','").next()?,
    };
    Some(format!("/XMLWebServices2/{token}/{path}"))
}

/// Selects the candidates matching the wanted dataset variant and rewrites
/// each into a navigable placeholder URL plus output naming.
///
/// Non-matching candidates are dropped silently; most rows describe
/// unrelated products and that is not an error.
pub fn select_downloads(
    candidates: &[LinkCandidate],
    wanted: DatasetFormat,
    token: &str,
    base_url: &str,
    out_dir: &Path,
) -> Vec<PendingDownload> {
    let mut seen_names = HashSet::new();
    let mut selected = Vec::new();
    for candidate in candidates {
        if candidate.category != wanted.row_label() {
            continue;
        }
        let Some(path) = placeholder_path(&candidate.placeholder, token) else {
            warn!(
                "skipping {:?}: onclick payload does not look like a gateway script call",
                candidate.name
            );
            continue;
        };
        if !candidate.name.is_empty() && !seen_names.insert(candidate.name.clone()) {
            // Two tasks targeting one path race with no defined winner.
            warn!(
                "duplicate candidate name {:?}; downloads would race on one file",
                candidate.name
            );
        }
        debug!("selected {:?} ({})", candidate.name, candidate.category);
        selected.push(PendingDownload {
            name: candidate.name.clone(),
            placeholder_url: format!("{base_url}{path}"),
            output_dir: out_dir.to_path_buf(),
            file_name: candidate_filename(&candidate.name),
        });
    }
    selected
}
