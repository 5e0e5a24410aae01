use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use claimscout_api::MediaKind;

use super::LinkRecord;

/// Canonical catalog identity of a scraped title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMatch {
    pub catalog_id: u64,
    pub canonical_title: String,
    pub kind: MediaKind,
    pub release_year: Option<String>,
}

/// A title discovered on a listing page, enriched as it moves through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateItem {
    pub title: String,
    /// First entry is the item's own detail page; episode pages are appended later.
    pub source_urls: Vec<String>,
    pub video_links: Vec<LinkRecord>,
    pub catalog_id: Option<u64>,
    pub canonical_title: Option<String>,
    pub media_kind: Option<MediaKind>,
    pub release_year: Option<String>,
    pub holder_name: Option<String>,
    /// Free-text metadata scraped from the listing or detail page.
    pub release_info: String,
    pub found_at: DateTime<Utc>,
}

impl CandidateItem {
    pub fn new(title: impl Into<String>, detail_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_urls: vec![detail_url.into()],
            video_links: Vec::new(),
            catalog_id: None,
            canonical_title: None,
            media_kind: None,
            release_year: None,
            holder_name: None,
            release_info: String::new(),
            found_at: Utc::now(),
        }
    }

    /// The item's own detail page.
    pub fn detail_url(&self) -> Option<&str> {
        self.source_urls.first().map(String::as_str)
    }

    /// Pages appended after the detail page (episodes or extra detail links).
    pub fn sub_page_urls(&self) -> &[String] {
        self.source_urls.get(1..).unwrap_or_default()
    }

    /// Append URLs not already present, preserving order.
    pub fn append_source_urls<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for url in urls {
            if !self.source_urls.contains(&url) {
                self.source_urls.push(url);
                added += 1;
            }
        }
        added
    }

    /// Record catalog identity and the verified rights holder.
    pub fn apply_match(&mut self, matched: &CatalogMatch, holder: &str) {
        self.catalog_id = Some(matched.catalog_id);
        self.canonical_title = Some(matched.canonical_title.clone());
        self.media_kind = Some(matched.kind);
        self.release_year = matched.release_year.clone();
        self.holder_name = Some(holder.to_string());
    }

    /// Display title: canonical catalog title once matched, otherwise the scraped one.
    pub fn display_title(&self) -> &str {
        self.canonical_title.as_deref().unwrap_or(&self.title)
    }
}
