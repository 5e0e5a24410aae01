use std::sync::atomic::{AtomicU64, Ordering};

use claimscout_api::{CatalogService, MediaKind, SearchHit, TitleDetails};

use crate::error::ScanError;
use crate::models::CatalogMatch;
use crate::normalize::{aggressive_clean, clean_title, extract_year, is_likely_series};

/// Queries shorter than this are never sent to the catalog.
const MIN_QUERY_CHARS: usize = 2;

/// Resolves scraped titles to catalog entries, counting every catalog call.
///
/// Strategy: cleaned title with year → cleaned title without year →
/// aggressively cleaned title with year → no match. Each step tries a movie
/// search (unless the raw title looks like a series) and then a series search,
/// and the first hit wins.
pub struct TitleMatcher<C> {
    catalog: C,
    api_calls: AtomicU64,
}

impl<C: CatalogService> TitleMatcher<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            api_calls: AtomicU64::new(0),
        }
    }

    /// Total catalog calls made so far (search and details).
    pub fn api_calls(&self) -> u64 {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Map a raw scraped title to its catalog identity.
    ///
    /// A miss is not an error; catalog transport failures are logged and
    /// treated as a miss for that search.
    pub async fn match_title(&self, raw_title: &str) -> Option<CatalogMatch> {
        let series = is_likely_series(raw_title);
        let cleaned = clean_title(raw_title);
        let year = extract_year(raw_title);

        tracing::debug!(raw = raw_title, cleaned = %cleaned, year = ?year, series, "Matching title");

        // Pass 1: cleaned title with year.
        if let Some(hit) = self.search_kinds(&cleaned, year.as_deref(), series).await {
            return Some(hit);
        }

        // Pass 2: drop the year, release years on listings are often wrong.
        if year.is_some() {
            if let Some(hit) = self.search_kinds(&cleaned, None, series).await {
                return Some(hit);
            }
        }

        // Pass 3: strip all punctuation.
        let aggressive = aggressive_clean(&cleaned);
        if aggressive != cleaned && aggressive.chars().count() > 2 {
            if let Some(hit) = self.search_kinds(&aggressive, year.as_deref(), series).await {
                return Some(hit);
            }
        }

        tracing::debug!(raw = raw_title, "No catalog match");
        None
    }

    /// Fetch rights metadata for a matched entry. Counted like a search.
    pub async fn details(
        &self,
        id: u64,
        kind: MediaKind,
    ) -> Result<Option<TitleDetails>, ScanError> {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
        self.catalog
            .details(id, kind)
            .await
            .map_err(|e| ScanError::Catalog(e.to_string()))
    }

    async fn search_kinds(
        &self,
        query: &str,
        year: Option<&str>,
        series: bool,
    ) -> Option<CatalogMatch> {
        if query.chars().count() < MIN_QUERY_CHARS {
            return None;
        }

        if !series {
            if let Some(hit) = self.search_one(MediaKind::Movie, query, year).await {
                return Some(to_match(hit, MediaKind::Movie));
            }
        }
        self.search_one(MediaKind::Series, query, year)
            .await
            .map(|hit| to_match(hit, MediaKind::Series))
    }

    async fn search_one(
        &self,
        kind: MediaKind,
        query: &str,
        year: Option<&str>,
    ) -> Option<SearchHit> {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
        match self.catalog.search(kind, query, year).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(%kind, query, error = %e, "Catalog search failed");
                None
            }
        }
    }
}

fn to_match(hit: SearchHit, kind: MediaKind) -> CatalogMatch {
    let release_year = hit
        .date
        .as_deref()
        .and_then(|d| d.get(..4))
        .map(str::to_string);
    CatalogMatch {
        catalog_id: hit.id,
        canonical_title: hit.title,
        kind,
        release_year,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    type SearchKey = (MediaKind, String, Option<String>);

    /// Catalog answering from a fixed table and recording every search.
    #[derive(Default)]
    struct FakeCatalog {
        hits: HashMap<SearchKey, SearchHit>,
        failing: bool,
        calls: Mutex<Vec<SearchKey>>,
    }

    impl FakeCatalog {
        fn with_hit(mut self, kind: MediaKind, query: &str, year: Option<&str>, id: u64) -> Self {
            self.hits.insert(
                (kind, query.to_string(), year.map(str::to_string)),
                SearchHit {
                    id,
                    title: query.to_string(),
                    date: Some("2021-11-24".into()),
                },
            );
            self
        }

        fn calls(&self) -> Vec<SearchKey> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CatalogService for FakeCatalog {
        type Error = std::io::Error;

        async fn search(
            &self,
            kind: MediaKind,
            query: &str,
            year: Option<&str>,
        ) -> Result<Option<SearchHit>, Self::Error> {
            let key = (kind, query.to_string(), year.map(str::to_string));
            self.calls.lock().unwrap().push(key.clone());
            if self.failing {
                return Err(std::io::Error::other("connection reset"));
            }
            Ok(self.hits.get(&key).cloned())
        }

        async fn details(
            &self,
            id: u64,
            _kind: MediaKind,
        ) -> Result<Option<TitleDetails>, Self::Error> {
            Ok(Some(TitleDetails {
                id,
                title: "Encanto".into(),
                release_date: None,
                companies: vec![],
                networks: vec![],
            }))
        }
    }

    #[tokio::test]
    async fn first_step_hit_makes_one_call() {
        let catalog = FakeCatalog::default().with_hit(MediaKind::Movie, "Encanto", Some("2021"), 568124);
        let matcher = TitleMatcher::new(catalog);

        let m = matcher.match_title("Encanto 2021 1080p").await.unwrap();
        assert_eq!(m.catalog_id, 568124);
        assert_eq!(m.kind, MediaKind::Movie);
        assert_eq!(m.release_year.as_deref(), Some("2021"));
        assert_eq!(matcher.api_calls(), 1);
    }

    #[tokio::test]
    async fn series_title_skips_movie_search() {
        let catalog = FakeCatalog::default().with_hit(MediaKind::Series, "Loki", None, 84958);
        let matcher = TitleMatcher::new(catalog);

        let m = matcher.match_title("Loki S01E03").await.unwrap();
        assert_eq!(m.kind, MediaKind::Series);
        assert!(matcher
            .catalog()
            .calls()
            .iter()
            .all(|(kind, _, _)| *kind == MediaKind::Series));
        assert_eq!(matcher.api_calls(), 1);
    }

    #[tokio::test]
    async fn retries_without_year() {
        let catalog = FakeCatalog::default().with_hit(MediaKind::Movie, "Soul", None, 508442);
        let matcher = TitleMatcher::new(catalog);

        let m = matcher.match_title("Soul (2021)").await.unwrap();
        assert_eq!(m.catalog_id, 508442);
        let calls = matcher.catalog().calls();
        assert_eq!(
            calls,
            vec![
                (MediaKind::Movie, "Soul".to_string(), Some("2021".to_string())),
                (MediaKind::Series, "Soul".to_string(), Some("2021".to_string())),
                (MediaKind::Movie, "Soul".to_string(), None),
            ]
        );
        assert_eq!(matcher.api_calls(), 3);
    }

    #[tokio::test]
    async fn aggressive_clean_is_last_resort() {
        let catalog = FakeCatalog::default().with_hit(
            MediaKind::Movie,
            "Spider Man No Way Home",
            None,
            634649,
        );
        let matcher = TitleMatcher::new(catalog);

        let m = matcher.match_title("Spider-Man: No Way Home").await.unwrap();
        assert_eq!(m.catalog_id, 634649);
        // movie + series for the cleaned title, then the aggressive movie search
        assert_eq!(matcher.api_calls(), 3);
    }

    #[tokio::test]
    async fn exhaustion_returns_none() {
        let matcher = TitleMatcher::new(FakeCatalog::default());
        assert!(matcher.match_title("Unknown Title 2020").await.is_none());
        // with year (2), without year (2); aggressive equals cleaned
        assert_eq!(matcher.api_calls(), 4);
    }

    #[tokio::test]
    async fn short_queries_are_not_sent() {
        let matcher = TitleMatcher::new(FakeCatalog::default());
        assert!(matcher.match_title("(2020) x").await.is_none());
        assert_eq!(matcher.api_calls(), 0);
    }

    #[tokio::test]
    async fn search_errors_count_as_misses() {
        let catalog = FakeCatalog {
            failing: true,
            ..Default::default()
        };
        let matcher = TitleMatcher::new(catalog);
        assert!(matcher.match_title("Encanto").await.is_none());
        assert_eq!(matcher.api_calls(), 2);
    }

    #[test]
    fn malformed_dates_do_not_panic() {
        let hit = |date: &str| SearchHit {
            id: 1,
            title: "Soul".into(),
            date: Some(date.into()),
        };
        assert_eq!(to_match(hit("2020-12-25"), MediaKind::Movie).release_year.as_deref(), Some("2020"));
        assert_eq!(to_match(hit("202é-01"), MediaKind::Movie).release_year, None);
        assert_eq!(to_match(hit("20"), MediaKind::Movie).release_year, None);
    }

    #[tokio::test]
    async fn details_calls_are_counted() {
        let matcher = TitleMatcher::new(FakeCatalog::default());
        let details = matcher.details(568124, MediaKind::Movie).await.unwrap();
        assert_eq!(details.unwrap().id, 568124);
        assert_eq!(matcher.api_calls(), 1);
    }
}
