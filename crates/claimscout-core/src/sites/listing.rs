use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{absolute_url, text_of, SiteAdapter};
use crate::models::CandidateItem;
use crate::navigator::Page;

static SEL_ARTICLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("article").unwrap());
static SEL_TITLE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2.h2-start a").unwrap());
static SEL_DETAIL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/stream/"]"#).unwrap());
static SEL_RELEASE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.releaseTitleHome").unwrap());

/// Paginated movie listing (`/page/N`), one `article` per title.
pub struct ListingSite;

impl SiteAdapter for ListingSite {
    fn name(&self) -> &'static str {
        "listing"
    }

    fn listing_urls(&self, base_url: &str, pages: u32) -> Vec<String> {
        let base = base_url.trim_end_matches('/');
        (1..=pages).map(|n| format!("{base}/page/{n}")).collect()
    }

    fn extract_items(&self, page: &Page) -> Vec<CandidateItem> {
        let doc = Html::parse_document(&page.html);
        let mut items = Vec::new();

        for article in doc.select(&SEL_ARTICLE) {
            let Some(link) = article.select(&SEL_TITLE_LINK).next() else {
                continue;
            };
            let title = text_of(link);
            let Some(url) = link.attr("href").and_then(|h| absolute_url(&page.url, h)) else {
                tracing::debug!(title = %title, "Listing entry without link");
                continue;
            };
            if title.is_empty() {
                continue;
            }

            let mut item = CandidateItem::new(title, url);
            item.append_source_urls(
                article
                    .select(&SEL_DETAIL_LINK)
                    .filter_map(|a| a.attr("href"))
                    .filter_map(|h| absolute_url(&page.url, h)),
            );
            if let Some(release) = article.select(&SEL_RELEASE).next() {
                item.release_info = text_of(release);
            }
            items.push(item);
        }

        tracing::debug!(url = %page.url, items = items.len(), "Listing page parsed");
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <article>
            <h2 class="h2-start"><a href="/stream/encanto">Encanto 2021</a></h2>
            <span class="releaseTitleHome">Encanto.2021.German.1080p</span>
            <a href="/stream/encanto">Ansehen</a>
            <a href="https://filmpalast.to/stream/encanto-hd">HD</a>
        </article>
        <article>
            <h2 class="h2-start"><a href="/stream/soul">Soul</a></h2>
        </article>
        <article><p>advert</p></article>
        </body></html>
    "#;

    #[test]
    fn listing_urls_are_paginated() {
        assert_eq!(
            ListingSite.listing_urls("https://filmpalast.to/", 2),
            vec![
                "https://filmpalast.to/page/1".to_string(),
                "https://filmpalast.to/page/2".to_string(),
            ]
        );
    }

    #[test]
    fn articles_become_items() {
        let page = Page::new("https://filmpalast.to/page/1", LISTING);
        let items = ListingSite.extract_items(&page);
        assert_eq!(items.len(), 2);

        let encanto = &items[0];
        assert_eq!(encanto.title, "Encanto 2021");
        assert_eq!(
            encanto.source_urls,
            vec![
                "https://filmpalast.to/stream/encanto".to_string(),
                "https://filmpalast.to/stream/encanto-hd".to_string(),
            ]
        );
        assert_eq!(encanto.release_info, "Encanto.2021.German.1080p");

        assert_eq!(items[1].source_urls.len(), 1);
        assert!(items[1].release_info.is_empty());
    }

    #[test]
    fn listing_has_no_detail_stage() {
        assert!(!ListingSite.has_detail_page());
        assert_eq!(ListingSite.link_scope(), Some("body"));
    }
}
