//! Strategies that read links straight from page markup.
//!
//! Everything here is synchronous: the parsed document never outlives the
//! call, so the async engine can await between strategies.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::hoster::{hoster_from_marker_link, hoster_from_url, hoster_near_element};
use super::is_valid_url;
use crate::models::LinkRecord;

/// Lazy-load attributes checked after `src`.
const FRAME_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-url"];

const TAGGED_SELECTORS: &[&str] = &[
    "a[data-player-url]",
    "a.iconPlay",
    "a.button.rb.iconPlay",
    "li[data-link-target]",
    "[data-player-url]",
    "a[data-video-url]",
    "div[data-stream-url]",
    ".streamPlayBtn a[href]",
];

/// Attribute priority when reading a URL from a tagged element.
const URL_ATTRS: &[&str] = &[
    "data-player-url",
    "data-video-url",
    "data-link-target",
    "data-stream-url",
    "href",
];

static SEL_IFRAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("iframe").unwrap());
static SEL_MARKER_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.watchEpisode").unwrap());

static RE_DATA_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-(?:player-url|video-url|stream-url|link-target)=["']([^"']+)["']"#).unwrap()
});
static RE_IFRAME_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<iframe[^>]*src=["']([^"']+)["']"#).unwrap());

/// A redirect-marker link waiting to be followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerLink {
    pub url: String,
    pub hoster: String,
}

/// Candidates from every markup strategy, each list in document order.
#[derive(Debug, Default)]
pub struct MarkupScan {
    pub frames: Vec<LinkRecord>,
    pub markers: Vec<MarkerLink>,
    pub tagged: Vec<LinkRecord>,
    pub raw: Vec<LinkRecord>,
}

/// Parse `html` once and run all markup strategies over the scope.
///
/// `scope` is a CSS selector; when absent, invalid or unmatched the whole
/// document is scanned.
pub fn scan_markup(html: &str, page_url: &str, scope: Option<&str>) -> MarkupScan {
    let doc = Html::parse_document(html);
    let scoped = scope.and_then(|s| find_scope(&doc, s));
    let root = scoped.unwrap_or_else(|| doc.root_element());

    let raw_source = match scoped {
        Some(el) => el.inner_html(),
        None => html.to_string(),
    };

    MarkupScan {
        frames: frame_sources(root),
        markers: marker_links(root, page_url),
        tagged: tagged_elements(root),
        raw: raw_matches(&raw_source),
    }
}

fn find_scope<'a>(doc: &'a Html, scope: &str) -> Option<ElementRef<'a>> {
    let selector = match Selector::parse(scope) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(scope, error = ?e, "Invalid extraction scope");
            return None;
        }
    };
    let found = doc.select(&selector).next();
    if found.is_none() {
        tracing::debug!(scope, "Scope not found, scanning whole page");
    }
    found
}

// ── Strategy 1: embedded frames ─────────────────────────────────

fn frame_sources(root: ElementRef<'_>) -> Vec<LinkRecord> {
    root.select(&SEL_IFRAME)
        .flat_map(|frame| FRAME_ATTRS.iter().filter_map(move |attr| frame.attr(attr)))
        .filter(|url| is_valid_url(url))
        .map(|url| LinkRecord::new(url, hoster_from_url(url)))
        .collect()
}

// ── Strategy 2: redirect markers (resolved by the engine) ───────

fn marker_links(root: ElementRef<'_>, page_url: &str) -> Vec<MarkerLink> {
    let base = url::Url::parse(page_url).ok();
    root.select(&SEL_MARKER_LINK)
        .filter_map(|link| {
            let href = link.attr("href").filter(|h| !h.is_empty())?;
            let url = match base.as_ref().and_then(|b| b.join(href).ok()) {
                Some(joined) => joined.to_string(),
                None if is_valid_url(href) => href.to_string(),
                None => {
                    tracing::warn!(href, page_url, "Cannot resolve redirect link");
                    return None;
                }
            };
            Some(MarkerLink {
                url,
                hoster: hoster_from_marker_link(link),
            })
        })
        .collect()
}

// ── Strategy 3: tagged attributes ───────────────────────────────

fn tagged_elements(root: ElementRef<'_>) -> Vec<LinkRecord> {
    TAGGED_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .flat_map(|sel| {
            root.select(&sel)
                .filter_map(|el| {
                    let url = url_from_element(el)?;
                    let hoster = hoster_near_element(el, &url);
                    Some(LinkRecord::new(url, hoster))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn url_from_element(el: ElementRef<'_>) -> Option<String> {
    URL_ATTRS
        .iter()
        .filter_map(|attr| el.attr(attr))
        .find(|url| is_valid_url(url))
        .map(str::to_string)
}

// ── Strategy 4: raw markup regex ────────────────────────────────

fn raw_matches(source: &str) -> Vec<LinkRecord> {
    RE_DATA_ATTR
        .captures_iter(source)
        .chain(RE_IFRAME_SRC.captures_iter(source))
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|url| is_valid_url(url))
        .map(|url| LinkRecord::new(url, hoster_from_url(url)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://site.example/stream/encanto";

    #[test]
    fn frames_include_lazy_attributes() {
        let html = r##"<iframe src="https://voe.sx/e/1"></iframe>
            <iframe src="about:blank" data-src="https://streamtape.com/e/2" data-url="#"></iframe>"##;
        let scan = scan_markup(html, PAGE, None);
        let urls: Vec<_> = scan.frames.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, ["https://voe.sx/e/1", "https://streamtape.com/e/2"]);
        assert_eq!(scan.frames[1].hoster, "Streamtape");
    }

    #[test]
    fn marker_links_are_joined() {
        let html = r#"<a class="watchEpisode" href="/redirect/17"><h4>VOE</h4></a>
            <a class="watchEpisode" href="">empty</a>"#;
        let scan = scan_markup(html, PAGE, None);
        assert_eq!(
            scan.markers,
            vec![MarkerLink {
                url: "https://site.example/redirect/17".into(),
                hoster: "VOE".into(),
            }]
        );
    }

    #[test]
    fn tagged_attribute_priority() {
        let html = r#"<ul><li><span class="hostName">Mixdrop HD</span>
            <p><a class="iconPlay" href="https://ignored.example/x" data-player-url="https://mixdrop.co/e/5">play</a></p>
            </li></ul>"#;
        let scan = scan_markup(html, PAGE, None);
        assert_eq!(scan.tagged[0], LinkRecord::new("https://mixdrop.co/e/5", "Mixdrop"));
    }

    #[test]
    fn raw_regex_catches_unselected_markup() {
        let html = r#"<span data-stream-url="https://dood.watch/e/3"></span>"#;
        let scan = scan_markup(html, PAGE, None);
        assert!(scan.tagged.is_empty());
        assert_eq!(scan.raw, vec![LinkRecord::new("https://dood.watch/e/3", "Dood")]);
    }

    #[test]
    fn scope_limits_every_strategy() {
        let html = r#"<article><iframe src="https://voe.sx/e/in"></iframe></article>
            <aside><iframe src="https://ads.example/out"></iframe></aside>"#;
        let scan = scan_markup(html, PAGE, Some("article"));
        assert_eq!(scan.frames.len(), 1);
        assert_eq!(scan.raw.len(), 1);
        assert_eq!(scan.raw[0].url, "https://voe.sx/e/in");
    }

    #[test]
    fn unmatched_scope_scans_whole_page() {
        let html = r#"<iframe src="https://voe.sx/e/1"></iframe>"#;
        assert_eq!(scan_markup(html, PAGE, Some("#missing")).frames.len(), 1);
        assert_eq!(scan_markup(html, PAGE, Some("[[bad")).frames.len(), 1);
    }

    #[test]
    fn empty_page_yields_nothing() {
        let scan = scan_markup("", PAGE, None);
        assert!(scan.frames.is_empty() && scan.markers.is_empty());
        assert!(scan.tagged.is_empty() && scan.raw.is_empty());
    }
}
