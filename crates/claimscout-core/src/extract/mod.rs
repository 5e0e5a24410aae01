//! Cascading video-link extraction.
//!
//! Links the site adapter already knows how to read come first. The page is
//! then scanned by four generic strategies in fixed priority order, all
//! feeding one seen-URL set so a URL found by several strategies is reported
//! once, by the first:
//!
//! 1. embedded frame sources (including lazy-load attributes)
//! 2. redirect-marker links, followed in an auxiliary browsing context
//! 3. elements tagged with player/stream attributes
//! 4. a regex sweep over the raw markup

pub mod hoster;
pub mod markup;
pub mod redirect;

use std::collections::HashSet;
use std::time::Duration;

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::models::LinkRecord;
use crate::navigator::{Navigator, Page};

use self::markup::scan_markup;
use self::redirect::resolve_redirect;

/// Whether a scraped value can be used as a video link.
pub fn is_valid_url(url: &str) -> bool {
    !url.is_empty() && url != "#" && url != "about:blank" && url.starts_with("http")
}

/// Timing for redirect resolution.
#[derive(Debug, Clone, Copy)]
pub struct ExtractSettings {
    pub redirect_timeout: Duration,
    pub redirect_settle: Duration,
}

impl ExtractSettings {
    pub fn from_config(scan: &ScanConfig) -> Self {
        Self {
            redirect_timeout: scan.redirect_timeout(),
            redirect_settle: scan.redirect_settle(),
        }
    }
}

/// Order-preserving link list with URL de-duplication.
#[derive(Debug, Default)]
struct LinkBatch {
    seen: HashSet<String>,
    links: Vec<LinkRecord>,
}

impl LinkBatch {
    fn push(&mut self, link: LinkRecord) -> bool {
        if self.seen.insert(link.url.clone()) {
            self.links.push(link);
            true
        } else {
            false
        }
    }

    fn extend(&mut self, links: impl IntoIterator<Item = LinkRecord>) -> usize {
        let mut added = 0;
        for link in links {
            if self.push(link) {
                added += 1;
            }
        }
        added
    }
}

pub struct LinkExtractor {
    settings: ExtractSettings,
}

impl LinkExtractor {
    pub fn new(settings: ExtractSettings) -> Self {
        Self { settings }
    }

    /// Extract de-duplicated video links from `page`, optionally restricted to
    /// the element matched by the `scope` selector. `site_links` are the
    /// adapter's own links for the page and take precedence.
    ///
    /// Missing content yields an empty list; only a fatal navigator error is
    /// returned as `Err`.
    pub async fn extract<N: Navigator>(
        &self,
        navigator: &N,
        page: &Page,
        scope: Option<&str>,
        site_links: Vec<LinkRecord>,
    ) -> Result<Vec<LinkRecord>, ScanError> {
        let scan = scan_markup(&page.html, &page.url, scope);
        let mut batch = LinkBatch::default();

        let site = batch.extend(site_links.into_iter().filter(|l| is_valid_url(&l.url)));
        tracing::debug!(url = %page.url, found = site, "Site links");

        let frames = batch.extend(scan.frames);
        tracing::debug!(url = %page.url, found = frames, "Frame sources");

        let mut resolved = 0;
        for marker in scan.markers {
            let target = resolve_redirect(
                navigator,
                &marker.url,
                self.settings.redirect_timeout,
                self.settings.redirect_settle,
            )
            .await?;

            match target {
                Some(url) if is_valid_url(&url) => {
                    if batch.push(LinkRecord::new(url, marker.hoster)) {
                        resolved += 1;
                    }
                }
                _ => tracing::debug!(redirect = %marker.url, "Redirect not resolved"),
            }
        }
        tracing::debug!(url = %page.url, found = resolved, "Redirect markers");

        let tagged = batch.extend(scan.tagged);
        let raw = batch.extend(scan.raw);
        tracing::debug!(url = %page.url, tagged, raw, "Attribute and markup sweeps");

        if batch.links.is_empty() {
            tracing::info!(url = %page.url, "No video links found");
        } else {
            tracing::info!(url = %page.url, links = batch.links.len(), "Video links extracted");
        }
        Ok(batch.links)
    }
}
