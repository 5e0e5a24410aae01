use serde::Deserialize;

use crate::traits::{Organization, SearchHit, TitleDetails};

// ── Search responses ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbSearchResult>,
}

/// A search result from either `/search/movie` or `/search/tv`.
///
/// Movies carry `title` + `release_date`, series carry `name` + `first_air_date`.
#[derive(Debug, Deserialize)]
pub struct TmdbSearchResult {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
}

impl TmdbSearchResult {
    pub fn into_search_hit(self) -> SearchHit {
        SearchHit {
            id: self.id,
            title: self.title.or(self.name).unwrap_or_default(),
            date: non_empty(self.release_date.or(self.first_air_date)),
        }
    }
}

// ── Detail responses ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TmdbDetails {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub production_companies: Vec<TmdbOrganization>,
    #[serde(default)]
    pub networks: Vec<TmdbOrganization>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbOrganization {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

impl TmdbDetails {
    pub fn into_title_details(self) -> TitleDetails {
        TitleDetails {
            id: self.id,
            title: self.title.or(self.name).unwrap_or_default(),
            release_date: non_empty(self.release_date.or(self.first_air_date)),
            companies: self
                .production_companies
                .into_iter()
                .map(TmdbOrganization::into_organization)
                .collect(),
            networks: self
                .networks
                .into_iter()
                .map(TmdbOrganization::into_organization)
                .collect(),
        }
    }
}

impl TmdbOrganization {
    fn into_organization(self) -> Organization {
        Organization {
            id: self.id,
            name: self.name,
        }
    }
}

/// TMDb returns `""` instead of `null` for unknown dates.
fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_search_result_uses_title_and_release_date() {
        let json = r#"{
            "page": 1,
            "results": [
                {"id": 277834, "title": "Vaiana", "release_date": "2016-11-23", "popularity": 80.1},
                {"id": 1241982, "title": "Vaiana 2", "release_date": "2024-11-21"}
            ]
        }"#;
        let resp: TmdbSearchResponse = serde_json::from_str(json).unwrap();
        let hit = resp.results.into_iter().next().unwrap().into_search_hit();
        assert_eq!(hit.id, 277834);
        assert_eq!(hit.title, "Vaiana");
        assert_eq!(hit.date.as_deref(), Some("2016-11-23"));
    }

    #[test]
    fn tv_search_result_uses_name_and_first_air_date() {
        let json = r#"{"results": [{"id": 82856, "name": "The Mandalorian", "first_air_date": "2019-11-12"}]}"#;
        let resp: TmdbSearchResponse = serde_json::from_str(json).unwrap();
        let hit = resp.results.into_iter().next().unwrap().into_search_hit();
        assert_eq!(hit.title, "The Mandalorian");
        assert_eq!(hit.date.as_deref(), Some("2019-11-12"));
    }

    #[test]
    fn empty_results() {
        let resp: TmdbSearchResponse =
            serde_json::from_str(r#"{"page": 1, "results": [], "total_results": 0}"#).unwrap();
        assert!(resp.results.is_empty());
    }

    #[test]
    fn details_collect_companies_and_networks() {
        let json = r#"{
            "id": 82856,
            "name": "The Mandalorian",
            "first_air_date": "2019-11-12",
            "production_companies": [
                {"id": 1, "logo_path": null, "name": "Lucasfilm Ltd.", "origin_country": "US"}
            ],
            "networks": [
                {"id": 2739, "name": "Disney+", "origin_country": ""}
            ]
        }"#;
        let details: TmdbDetails = serde_json::from_str(json).unwrap();
        let details = details.into_title_details();
        assert_eq!(details.title, "The Mandalorian");
        assert_eq!(details.release_year().as_deref(), Some("2019"));
        assert_eq!(details.companies[0].id, 1);
        assert_eq!(details.networks[0].name, "Disney+");
    }

    #[test]
    fn movie_details_without_networks() {
        let json = r#"{"id": 1, "title": "Encanto", "release_date": "", "production_companies": []}"#;
        let details: TmdbDetails = serde_json::from_str(json).unwrap();
        let details = details.into_title_details();
        assert!(details.networks.is_empty());
        assert_eq!(details.release_date, None);
        assert_eq!(details.release_year(), None);
    }
}
