//! Trait definitions for media catalog services.
//!
//! The scan pipeline only talks to a catalog through [`CatalogService`], so
//! the TMDb client can be swapped for a fake in tests.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Which catalog collection to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Path segment used by TMDb for this kind.
    pub fn as_path(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "tv",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Series => write!(f, "series"),
        }
    }
}

/// A media catalog that can resolve titles to canonical works.
pub trait CatalogService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Search one collection and return its top result, if any.
    fn search(
        &self,
        kind: MediaKind,
        query: &str,
        year: Option<&str>,
    ) -> impl Future<Output = Result<Option<SearchHit>, Self::Error>> + Send;

    /// Fetch ownership metadata for a catalog entry.
    fn details(
        &self,
        id: u64,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Option<TitleDetails>, Self::Error>> + Send;
}

/// Top search result from a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    pub title: String,
    /// Release (movie) or first-air (series) date, `YYYY-MM-DD`.
    pub date: Option<String>,
}

/// A production company or broadcast network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: u64,
    pub name: String,
}

/// Catalog details relevant to rights verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDetails {
    pub id: u64,
    pub title: String,
    pub release_date: Option<String>,
    pub companies: Vec<Organization>,
    pub networks: Vec<Organization>,
}

impl TitleDetails {
    /// First four characters of the release date, when present.
    pub fn release_year(&self) -> Option<String> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .map(str::to_string)
    }
}
