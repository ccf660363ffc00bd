use log::{info, warn};
use scraper::{Html, Selector};

use crate::download::DownloadPool;
use crate::filename::signed_url_filename;
use crate::normalize::normalize;
use crate::render::PageRenderer;
use crate::types::{DownloadTask, GatewayError, PendingDownload, ResolvedDownload};

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveSettings {
    /// How many non-matching completion signals to tolerate per candidate
    /// before moving on. `None` preserves the baseline behaviour: block
    /// until the surface produces a matching page.
    pub max_idle_completions: Option<usize>,
}

/// Drives the render surface over each pending download, one at a time, and
/// hands every resolved signed URL to the pool.
///
/// Strictly sequential: the surface is a single stateful document, so only
/// one handshake is ever in flight. Downloads overlap freely once submitted.
/// Returns the resolved downloads in handshake order.
pub async fn resolve_and_download(
    renderer: &mut dyn PageRenderer,
    pending: Vec<PendingDownload>,
    pool: &mut DownloadPool,
    settings: ResolveSettings,
) -> Result<Vec<ResolvedDownload>, GatewayError> {
    let mut resolved = Vec::new();
    for item in pending {
        info!("resolving {:?} via {}", item.name, item.placeholder_url);
        renderer.navigate(&item.placeholder_url).await?;

        let mut idle = 0usize;
        loop {
            let html = renderer.await_completion().await?;
            if let Some(signed_url) = find_signed_url(&normalize(&html)) {
                let file_name = item
                    .file_name
                    .clone()
                    .unwrap_or_else(|| signed_url_filename(&signed_url));
                let download = ResolvedDownload {
                    name: item.name.clone(),
                    signed_url,
                    output_path: item.output_dir.join(file_name),
                };
                pool.submit(DownloadTask {
                    url: download.signed_url.clone(),
                    output_path: download.output_path.clone(),
                });
                resolved.push(download);
                break;
            }

            idle += 1;
            if let Some(limit) = settings.max_idle_completions {
                if idle >= limit {
                    warn!(
                        "no signed link for {:?} after {idle} completion(s); moving on",
                        item.name
                    );
                    break;
                }
            }
        }
    }
    Ok(resolved)
}

/// The signed link is the last anchor whose href carries the `downloadID`
/// query marker; earlier handshake steps render progress pages without it.
pub fn find_signed_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;
    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.contains("downloadID"))
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_url_is_the_last_marked_anchor() {
        let html = r#"<html><body>
            <a href="http://example.gov/help">help</a>
            <a href="http://example.gov/getData?downloadID=111">stale</a>
            <a href="http://example.gov/getData?downloadID=999">fresh</a>
        </body></html>"#;
        assert_eq!(
            find_signed_url(html),
            Some("http://example.gov/getData?downloadID=999".to_string())
        );
    }

    #[test]
    fn progress_pages_without_marker_yield_nothing() {
        let html = r#"<html><body><a href="/status">working...</a></body></html>"#;
        assert_eq!(find_signed_url(html), None);
    }
}
