use std::time::Duration;

use reqwest::Client;

use super::error::TmdbError;
use super::types::{TmdbDetails, TmdbSearchResponse};
use crate::traits::{CatalogService, MediaKind, SearchHit, TitleDetails};

/// TMDb REST API v3 client authenticated with an API key.
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    language: String,
    http: Client,
}

impl TmdbClient {
    /// Build a client with a custom endpoint, response language and request timeout.
    pub fn with_options(
        api_key: String,
        base_url: &str,
        language: &str,
        timeout: Duration,
    ) -> Result<Self, TmdbError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            http,
        })
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TmdbError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "TMDb API error");
            Err(TmdbError::Api {
                status,
                message: body,
            })
        }
    }

    /// Query parameter carrying the year filter for the given kind.
    ///
    /// Series are filtered by first air date, movies by release year.
    fn year_param(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Movie => "year",
            MediaKind::Series => "first_air_date_year",
        }
    }
}

impl CatalogService for TmdbClient {
    type Error = TmdbError;

    async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        year: Option<&str>,
    ) -> Result<Option<SearchHit>, TmdbError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("api_key", self.api_key.as_str()),
            ("query", query),
            ("language", self.language.as_str()),
        ];
        if let Some(year) = year {
            params.push((Self::year_param(kind), year));
        }

        let resp = self
            .http
            .get(format!("{}/search/{}", self.base_url, kind.as_path()))
            .query(&params)
            .send()
            .await?;
        tracing::debug!(url = %resp.url().path(), %kind, query, "TMDb search");

        let resp = Self::check_response(resp).await?;
        let body: TmdbSearchResponse = resp
            .json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))?;

        Ok(body
            .results
            .into_iter()
            .next()
            .map(|r| r.into_search_hit()))
    }

    async fn details(&self, id: u64, kind: MediaKind) -> Result<Option<TitleDetails>, TmdbError> {
        let resp = self
            .http
            .get(format!("{}/{}/{id}", self.base_url, kind.as_path()))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resp = Self::check_response(resp).await?;
        let body: TmdbDetails = resp
            .json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))?;

        Ok(Some(body.into_title_details()))
    }
}
