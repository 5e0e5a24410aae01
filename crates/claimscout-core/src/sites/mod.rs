//! Per-site knowledge: where the listings are, how items and episodes are
//! marked up, and which part of a page holds the players.

mod listing;
mod series_index;

pub use listing::ListingSite;
pub use series_index::SeriesIndexSite;

use scraper::ElementRef;

use crate::config::AdapterKind;
use crate::models::{CandidateItem, LinkRecord};
use crate::navigator::Page;

/// Capabilities of one crawled site. Parsing is synchronous; the scanner
/// does all navigation.
pub trait SiteAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Listing pages to discover items from.
    fn listing_urls(&self, base_url: &str, pages: u32) -> Vec<String>;

    /// Candidate items on one listing page, first URL set to the item's own page.
    fn extract_items(&self, page: &Page) -> Vec<CandidateItem>;

    /// Whether each item's own page must be fetched before extraction
    /// (metadata and episode enumeration).
    fn has_detail_page(&self) -> bool {
        false
    }

    /// Free-text metadata from an item's detail page.
    fn detail_metadata(&self, _page: &Page) -> String {
        String::new()
    }

    /// Absolute episode URLs listed on a detail page, in page order.
    fn episode_links(&self, _page: &Page) -> Vec<String> {
        Vec::new()
    }

    /// Video links read with site-specific rules from a content page. They
    /// lead the extraction batch, ahead of the generic strategies.
    fn content_links(&self, _page: &Page) -> Vec<LinkRecord> {
        Vec::new()
    }

    /// Selector restricting link extraction on content pages.
    fn link_scope(&self) -> Option<&'static str> {
        Some("body")
    }
}

pub fn adapter_for(kind: AdapterKind) -> Box<dyn SiteAdapter> {
    match kind {
        AdapterKind::Listing => Box::new(ListingSite),
        AdapterKind::SeriesIndex => Box::new(SeriesIndexSite),
    }
}

/// Resolve `href` against the page it was found on.
fn absolute_url(page_url: &str, href: &str) -> Option<String> {
    url::Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .ok()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
