use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use claimscout_api::CatalogService;

use crate::config::AppConfig;
use crate::error::ScanError;
use crate::extract::{ExtractSettings, LinkExtractor};
use crate::matcher::TitleMatcher;
use crate::models::{CandidateItem, LinkRecord};
use crate::navigator::Navigator;
use crate::sites::{adapter_for, SiteAdapter};
use crate::storage::Storage;
use crate::verifier::RightsVerifier;

/// Run-level counters, reported at the end of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub pages_scanned: u64,
    pub items_checked: u64,
    pub verified: u64,
    pub findings: u64,
    pub links_collected: u64,
    pub links_persisted: u64,
    pub api_calls: u64,
    pub errors: u64,
}

/// What happened to one candidate item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// No catalog entry (or no details) for the title.
    NoMatch,
    /// Matched, but not owned by a watched rights holder.
    NotVerified { catalog_id: u64 },
    /// Verified, but no page yielded a video link.
    NoLinks { holder: String },
    /// Verified and links stored.
    Persisted {
        holder: String,
        links: usize,
        persisted: usize,
    },
}

/// Scan limits and pacing taken from the config.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub base_url: String,
    pub website: String,
    pub listing_pages: u32,
    pub max_items: Option<usize>,
    pub page_delay: Duration,
    pub item_delay: Duration,
    pub max_episodes: usize,
    pub max_pages_per_item: usize,
}

impl ScanOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.site.base_url.clone(),
            website: config.website(),
            listing_pages: config.site.listing_pages,
            max_items: config.site.max_items,
            page_delay: config.scan.page_delay(),
            item_delay: config.scan.item_delay(),
            max_episodes: config.scan.max_episodes,
            max_pages_per_item: config.scan.max_pages_per_item,
        }
    }
}

/// Drives one scan: listing discovery, then per item
/// detail fetch → match → verify → episodes → extraction → persist.
///
/// Items are processed sequentially. A failing item is counted once in
/// `errors` and never stops the run; only a navigator that fails to start
/// does.
pub struct Scanner<N, C> {
    navigator: N,
    matcher: TitleMatcher<C>,
    verifier: RightsVerifier,
    extractor: LinkExtractor,
    adapter: Box<dyn SiteAdapter>,
    storage: Storage,
    options: ScanOptions,
    summary: ScanSummary,
    findings: Vec<CandidateItem>,
}

impl<N: Navigator, C: CatalogService> Scanner<N, C> {
    pub fn new(config: &AppConfig, navigator: N, catalog: C, storage: Storage) -> Self {
        Self {
            navigator,
            matcher: TitleMatcher::new(catalog),
            verifier: RightsVerifier::from_config(&config.rights),
            extractor: LinkExtractor::new(ExtractSettings::from_config(&config.scan)),
            adapter: adapter_for(config.site.adapter),
            storage,
            options: ScanOptions::from_config(config),
            summary: ScanSummary::default(),
            findings: Vec::new(),
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Verified items that produced links, in processing order.
    pub fn findings(&self) -> &[CandidateItem] {
        &self.findings
    }

    /// Run a full scan. The navigator is started here and always stopped
    /// before returning.
    pub async fn run(&mut self) -> Result<ScanSummary, ScanError> {
        info!(site = self.adapter.name(), base_url = %self.options.base_url, "Starting scan");

        if let Err(e) = self.navigator.start().await {
            tracing::error!(error = %e, "Navigator failed to start");
            self.navigator.stop().await;
            return Err(e.into());
        }

        self.scan().await;
        self.navigator.stop().await;
        self.summary.api_calls = self.matcher.api_calls();

        let s = &self.summary;
        info!(
            pages_scanned = s.pages_scanned,
            items_checked = s.items_checked,
            verified = s.verified,
            findings = s.findings,
            links_collected = s.links_collected,
            links_persisted = s.links_persisted,
            api_calls = s.api_calls,
            errors = s.errors,
            "Scan complete"
        );
        Ok(self.summary.clone())
    }

    async fn scan(&mut self) {
        let items = self.discover().await;
        let total = items.len();
        info!(items = total, "Checking discovered items");

        for (idx, mut item) in items.into_iter().enumerate() {
            self.summary.items_checked += 1;
            debug!(n = idx + 1, total, title = %item.title, "Processing item");

            match self.process_item(&mut item).await {
                Ok(outcome) => self.record(outcome, item),
                Err(e) => {
                    self.summary.errors += 1;
                    warn!(title = %item.title, error = %e, "Item failed");
                }
            }

            tokio::time::sleep(self.options.item_delay).await;
        }
    }

    // ── Stage: listing discovery ────────────────────────────────

    async fn discover(&mut self) -> Vec<CandidateItem> {
        let urls = self
            .adapter
            .listing_urls(&self.options.base_url, self.options.listing_pages);
        let mut items: Vec<CandidateItem> = Vec::new();

        for url in urls {
            match self.navigator.fetch(&url).await {
                Ok(Some(page)) => {
                    self.summary.pages_scanned += 1;
                    let found = self.adapter.extract_items(&page);
                    info!(url = %url, items = found.len(), "Listing page scanned");
                    merge_items(&mut items, found);
                }
                Ok(None) => warn!(url = %url, "Listing page skipped"),
                Err(e) => warn!(url = %url, error = %e, "Listing page failed"),
            }
            tokio::time::sleep(self.options.page_delay).await;
        }

        if let Some(max) = self.options.max_items {
            items.truncate(max);
        }
        items
    }

    // ── Stage: per item ─────────────────────────────────────────

    #[tracing::instrument(skip(self, item), fields(title = %item.title))]
    async fn process_item(&self, item: &mut CandidateItem) -> Result<ItemOutcome, ScanError> {
        let episodes = self.fetch_detail(item).await?;

        let Some(mut matched) = self.matcher.match_title(&item.title).await else {
            debug!("Not in catalog");
            return Ok(ItemOutcome::NoMatch);
        };
        let Some(details) = self.matcher.details(matched.catalog_id, matched.kind).await? else {
            debug!(catalog_id = matched.catalog_id, "Catalog details missing");
            return Ok(ItemOutcome::NoMatch);
        };

        let verdict = self.verifier.verify(&details);
        let Some(holder) = verdict.holder_name.filter(|_| verdict.is_verified) else {
            debug!(catalog_id = matched.catalog_id, "Not a watched rights holder");
            return Ok(ItemOutcome::NotVerified {
                catalog_id: matched.catalog_id,
            });
        };

        matched.canonical_title = details.title.clone();
        if matched.release_year.is_none() {
            matched.release_year = details.release_year();
        }
        item.apply_match(&matched, &holder);
        info!(holder = %holder, canonical = %matched.canonical_title, "Rights holder verified");

        if !episodes.is_empty() {
            let added = item.append_source_urls(episodes.into_iter().take(self.options.max_episodes));
            debug!(episodes = added, "Episodes enumerated");
        }

        let links = self.extract_links(item).await?;
        item.video_links = links;

        if item.video_links.is_empty() {
            info!("Verified but no video links found");
            return Ok(ItemOutcome::NoLinks { holder });
        }

        let persisted = self
            .storage
            .insert_links(&holder, &item.video_links, &self.options.website)?;
        Ok(ItemOutcome::Persisted {
            holder,
            links: item.video_links.len(),
            persisted,
        })
    }

    /// Fetch the item's own page for adapters that have one, recording its
    /// metadata and returning the episode URLs found there.
    async fn fetch_detail(&self, item: &mut CandidateItem) -> Result<Vec<String>, ScanError> {
        if !self.adapter.has_detail_page() {
            return Ok(Vec::new());
        }
        let Some(url) = item.detail_url().map(str::to_string) else {
            return Ok(Vec::new());
        };

        match self.navigator.fetch(&url).await? {
            Some(page) => {
                let metadata = self.adapter.detail_metadata(&page);
                if !metadata.is_empty() {
                    item.release_info = metadata;
                }
                Ok(self.adapter.episode_links(&page))
            }
            None => {
                warn!(url = %url, "Detail page unavailable");
                Ok(Vec::new())
            }
        }
    }

    /// Run the extractor over the item's content pages and merge the results.
    async fn extract_links(&self, item: &CandidateItem) -> Result<Vec<LinkRecord>, ScanError> {
        let candidates: &[String] = if self.adapter.has_detail_page() {
            item.sub_page_urls()
        } else {
            &item.source_urls
        };

        let mut pages: Vec<&str> = Vec::new();
        for url in candidates {
            if !pages.contains(&url.as_str()) {
                pages.push(url);
            }
        }
        pages.truncate(self.options.max_pages_per_item);

        let mut merged: Vec<LinkRecord> = Vec::new();
        for url in pages {
            let Some(page) = self.navigator.fetch(url).await? else {
                continue;
            };
            let site_links = self.adapter.content_links(&page);
            let links = self
                .extractor
                .extract(&self.navigator, &page, self.adapter.link_scope(), site_links)
                .await?;
            for link in links {
                if !merged.iter().any(|l| l.url == link.url) {
                    merged.push(link);
                }
            }
        }
        Ok(merged)
    }

    fn record(&mut self, outcome: ItemOutcome, item: CandidateItem) {
        match outcome {
            ItemOutcome::NoMatch | ItemOutcome::NotVerified { .. } => {}
            ItemOutcome::NoLinks { .. } => self.summary.verified += 1,
            ItemOutcome::Persisted {
                holder,
                links,
                persisted,
            } => {
                self.summary.verified += 1;
                self.summary.findings += 1;
                self.summary.links_collected += links as u64;
                self.summary.links_persisted += persisted as u64;
                info!(title = %item.display_title(), holder = %holder, links, persisted, "Finding stored");
                self.findings.push(item);
            }
        }
    }
}

/// Add newly discovered items, folding ones whose own page is already known
/// into the existing entry.
fn merge_items(items: &mut Vec<CandidateItem>, found: Vec<CandidateItem>) {
    for item in found {
        let existing = items
            .iter()
            .position(|known| known.detail_url().is_some() && known.detail_url() == item.detail_url());
        match existing {
            Some(pos) => {
                items[pos].append_source_urls(item.source_urls);
            }
            None => items.push(item),
        }
    }
}
