use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{absolute_url, text_of, SiteAdapter};
use crate::extract::hoster::UNKNOWN_HOSTER;
use crate::models::{CandidateItem, LinkRecord};
use crate::navigator::Page;

const INDEX_PATH: &str = "andere-serien";

/// Episode links have at least this many path separators
/// (`/serie/<name>/<season>/<episode>/<language>`).
const EPISODE_MIN_SLASHES: usize = 5;

static SEL_SERIES_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#seriesContainer .genre ul li a").unwrap());
static SEL_EPISODE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"table.episodes tr td a[href*="serie/"]"#).unwrap());
static SEL_HOSTER_TAB: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.hoster-tabs a").unwrap());
static SEL_HOSTER_ICON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("i.hoster").unwrap());
static SEL_INFO_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".infos div").unwrap());
static SEL_SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static SEL_P: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static SEL_P_EM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p em").unwrap());

/// Single alphabetical series index; episodes are enumerated from each
/// series page.
pub struct SeriesIndexSite;

impl SeriesIndexSite {
    /// Text under the `.infos` block whose label span contains `label`.
    fn info_value(doc: &Html, label: &str, value: &Selector) -> Option<String> {
        doc.select(&SEL_INFO_BLOCK)
            .find(|block| {
                block
                    .select(&SEL_SPAN)
                    .any(|span| text_of(span).contains(label))
            })
            .and_then(|block| block.select(value).next())
            .map(text_of)
            .filter(|s| !s.is_empty())
    }
}

impl SiteAdapter for SeriesIndexSite {
    fn name(&self) -> &'static str {
        "series-index"
    }

    fn listing_urls(&self, base_url: &str, _pages: u32) -> Vec<String> {
        vec![format!("{}/{INDEX_PATH}", base_url.trim_end_matches('/'))]
    }

    fn extract_items(&self, page: &Page) -> Vec<CandidateItem> {
        let doc = Html::parse_document(&page.html);
        let items: Vec<CandidateItem> = doc
            .select(&SEL_SERIES_LINK)
            .filter_map(|link| {
                let title = text_of(link);
                let url = link.attr("href").and_then(|h| absolute_url(&page.url, h))?;
                (!title.is_empty()).then(|| CandidateItem::new(title, url))
            })
            .collect();

        tracing::debug!(url = %page.url, series = items.len(), "Series index parsed");
        items
    }

    fn has_detail_page(&self) -> bool {
        true
    }

    /// Hoster tabs (`ul.hoster-tabs a`, hoster from `title` or the link text),
    /// then language-tagged episode table links (hoster from the `i.hoster`
    /// icon class). Relative hrefs are joined against the page.
    fn content_links(&self, page: &Page) -> Vec<LinkRecord> {
        let doc = Html::parse_document(&page.html);
        let mut links: Vec<LinkRecord> = Vec::new();
        let mut push = |link: LinkRecord| {
            if !links.iter().any(|l| l.url == link.url) {
                links.push(link);
            }
        };

        for tab in doc.select(&SEL_HOSTER_TAB) {
            let Some(href) = tab.attr("href").filter(|h| !h.is_empty()) else {
                continue;
            };
            let hoster = tab
                .attr("title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| text_of(tab));
            if hoster.is_empty() {
                continue;
            }

            let href = if href.starts_with('/') || href.starts_with("http") {
                href.to_string()
            } else {
                format!("/{href}")
            };
            match absolute_url(&page.url, &href) {
                Some(url) => push(LinkRecord::new(url, hoster)),
                None => tracing::warn!(href = %href, "Cannot resolve hoster tab"),
            }
        }

        for link in doc.select(&SEL_EPISODE_LINK) {
            let Some(href) = link
                .attr("href")
                .filter(|h| h.contains("/de") || h.contains("/en"))
                .filter(|h| h.matches('/').count() >= EPISODE_MIN_SLASHES)
            else {
                continue;
            };
            let Some(url) = absolute_url(&page.url, href) else {
                continue;
            };
            let hoster = link
                .select(&SEL_HOSTER_ICON)
                .next()
                .and_then(|icon| icon.attr("class"))
                .and_then(|class| class.split_whitespace().find(|c| *c != "hoster"))
                .unwrap_or(UNKNOWN_HOSTER)
                .to_string();
            push(LinkRecord::new(url, hoster));
        }

        tracing::debug!(url = %page.url, links = links.len(), "Hoster links read");
        links
    }

    fn detail_metadata(&self, page: &Page) -> String {
        let doc = Html::parse_document(&page.html);
        let genres = Self::info_value(&doc, "Genres", &SEL_P);
        let years = Self::info_value(&doc, "Produktionsjahre", &SEL_P_EM);

        match (genres, years) {
            (Some(g), Some(y)) => format!("Genres: {g} | Years: {y}"),
            (Some(g), None) => format!("Genres: {g}"),
            (None, Some(y)) => format!("Years: {y}"),
            (None, None) => String::new(),
        }
    }

    fn episode_links(&self, page: &Page) -> Vec<String> {
        let doc = Html::parse_document(&page.html);
        let mut urls: Vec<String> = Vec::new();
        for href in doc
            .select(&SEL_EPISODE_LINK)
            .filter_map(|a| a.attr("href"))
            .filter(|h| h.matches('/').count() >= EPISODE_MIN_SLASHES)
        {
            if let Some(url) = absolute_url(&page.url, href) {
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }
        urls
    }
}
