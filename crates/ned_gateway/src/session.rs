use log::{debug, info, warn};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::decode::decode_page;
use crate::fetch::Fetcher;
use crate::normalize::{normalize, normalize_replay};
use crate::scan::scan_results_page;
use crate::types::{GatewayError, LinkCandidate, SessionContext};

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Scheme and host of the query gateway, no trailing slash.
    pub base_url: String,
    pub epsg: u32,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://gisdata.usgs.gov".to_string(),
            epsg: 4326,
        }
    }
}

/// Query bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

fn query_path(bbox: BoundingBox, epsg: u32) -> String {
    format!(
        "/XMLWebServices2/getTDDSDownloadURLs.aspx?XMin={}&YMin={}&XMax={}&YMax={}&EPSG={}&STATE=&COUNTY=",
        bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax, epsg
    )
}

/// The session id is the bracketed `(S(...))` segment of the replay path.
pub fn extract_session_token(url: &str) -> Option<&str> {
    let start = url.find("(S(")?;
    let rest = &url[start..];
    let end = rest.find("))")?;
    Some(&rest[..end + 2])
}

/// Runs the query / session-replay protocol and produces the final candidate
/// list plus the extracted session token.
///
/// At most one redirect is followed. The gateway has never been observed to
/// signal a second one; if it does, the signal is ignored and the replay
/// pass's candidates are used regardless.
pub async fn resolve_session(
    fetcher: &dyn Fetcher,
    settings: &GatewaySettings,
    bbox: BoundingBox,
) -> Result<SessionContext, GatewayError> {
    let query_url = format!("{}{}", settings.base_url, query_path(bbox, settings.epsg));
    info!("querying gateway: {query_url}");
    let page = fetcher.fetch(&query_url).await?;
    let html = normalize(&decode_page(&page.bytes, page.content_type.as_deref()));
    let first_pass = scan_results_page(&html);

    let Some(target) = first_pass.redirect_target else {
        debug!(
            "no session redirect; {} candidate(s) from the first pass",
            first_pass.candidates.len()
        );
        return finish(String::new(), first_pass.candidates);
    };

    // The server answers the first query with an "Object moved" body whose
    // anchor points at a session-scoped copy of the same query.
    let target = percent_decode_str(&target).decode_utf8_lossy().into_owned();
    let token = extract_session_token(&target)
        .ok_or_else(|| GatewayError::Protocol {
            url: target.clone(),
        })?
        .to_string();
    info!("session redirect detected, replaying with token {token}");

    let replay = replay_url(&settings.base_url, &target).ok_or_else(|| GatewayError::Protocol {
        url: target.clone(),
    })?;
    let page = fetcher.fetch(&replay).await?;
    let html = normalize_replay(&decode_page(&page.bytes, page.content_type.as_deref()));
    let second_pass = scan_results_page(&html);
    if second_pass.redirect_target.is_some() {
        warn!("second session redirect signalled; ignoring it");
    }
    finish(token, second_pass.candidates)
}

fn finish(
    token: String,
    candidates: Vec<LinkCandidate>,
) -> Result<SessionContext, GatewayError> {
    if candidates.is_empty() {
        return Err(GatewayError::NoResults);
    }
    Ok(SessionContext { token, candidates })
}

fn replay_url(base: &str, target: &str) -> Option<String> {
    if let Ok(absolute) = Url::parse(target) {
        return Some(String::from(absolute));
    }
    Url::parse(base)
        .ok()?
        .join(target)
        .ok()
        .map(String::from)
}
