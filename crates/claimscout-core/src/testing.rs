//! In-memory navigator and catalog used by the pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use claimscout_api::{CatalogService, MediaKind, Organization, SearchHit, TitleDetails};

use crate::error::NavError;
use crate::navigator::{BrowsingContext, Navigator, Page};

/// What a redirect URL does when opened in a context.
#[derive(Clone)]
pub enum RedirectPage {
    /// Served at a final URL with the given markup.
    Served { final_url: String, html: String },
    /// Never finishes loading.
    Hang,
}

#[derive(Default)]
pub struct FakeNavigator {
    pub pages: HashMap<String, String>,
    pub redirects: Arc<HashMap<String, RedirectPage>>,
    pub fail_start: bool,
    /// Pages whose fetch raises instead of loading.
    pub failing: HashSet<String>,
    pub started: bool,
    pub fetched: Mutex<Vec<String>>,
    pub contexts_opened: Arc<AtomicUsize>,
    pub contexts_closed: Arc<AtomicUsize>,
    pub stop_calls: usize,
}

impl FakeNavigator {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_failing_page(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn with_redirect(mut self, url: &str, page: RedirectPage) -> Self {
        Arc::make_mut(&mut self.redirects).insert(url.to_string(), page);
        self
    }

    pub fn started(mut self) -> Self {
        self.started = true;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl Navigator for FakeNavigator {
    type Context = FakeContext;

    async fn start(&mut self) -> Result<(), NavError> {
        if self.fail_start {
            return Err(NavError::Unavailable("no browser".into()));
        }
        self.started = true;
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Option<Page>, NavError> {
        if !self.started {
            return Err(NavError::NotStarted);
        }
        self.fetched.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(NavError::Unavailable("page crashed".into()));
        }
        Ok(self.pages.get(url).map(|html| Page::new(url, html.as_str())))
    }

    async fn open_context(&self) -> Result<FakeContext, NavError> {
        if !self.started {
            return Err(NavError::NotStarted);
        }
        self.contexts_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeContext {
            redirects: Arc::clone(&self.redirects),
            closed: Arc::clone(&self.contexts_closed),
            current_url: String::new(),
            body: String::new(),
        })
    }

    async fn stop(&mut self) {
        self.started = false;
        self.stop_calls += 1;
    }
}

pub struct FakeContext {
    redirects: Arc<HashMap<String, RedirectPage>>,
    closed: Arc<AtomicUsize>,
    current_url: String,
    body: String,
}

impl BrowsingContext for FakeContext {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<(), NavError> {
        match self.redirects.get(url).cloned() {
            Some(RedirectPage::Served { final_url, html }) => {
                self.current_url = final_url;
                self.body = html;
                Ok(())
            }
            Some(RedirectPage::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            None => Err(NavError::Timeout(url.to_string())),
        }
    }

    async fn content(&self) -> Result<String, NavError> {
        Ok(self.body.clone())
    }

    fn current_url(&self) -> String {
        self.current_url.clone()
    }

    async fn close(self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Catalog with a fixed title table. Every title is a movie hit unless listed
/// under `series`; details carry the configured companies.
#[derive(Default)]
pub struct FakeCatalog {
    pub movies: HashMap<String, u64>,
    pub series: HashMap<String, u64>,
    pub companies: HashMap<u64, Vec<Organization>>,
    pub networks: HashMap<u64, Vec<Organization>>,
    pub failing_details: HashSet<u64>,
}

impl FakeCatalog {
    pub fn movie(mut self, title: &str, id: u64, company: (u64, &str)) -> Self {
        self.movies.insert(title.to_string(), id);
        self.companies.insert(
            id,
            vec![Organization {
                id: company.0,
                name: company.1.to_string(),
            }],
        );
        self
    }

    pub fn show(mut self, title: &str, id: u64, network: (u64, &str)) -> Self {
        self.series.insert(title.to_string(), id);
        self.networks.insert(
            id,
            vec![Organization {
                id: network.0,
                name: network.1.to_string(),
            }],
        );
        self
    }
}

impl CatalogService for FakeCatalog {
    type Error = std::io::Error;

    async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        _year: Option<&str>,
    ) -> Result<Option<SearchHit>, Self::Error> {
        let table = match kind {
            MediaKind::Movie => &self.movies,
            MediaKind::Series => &self.series,
        };
        Ok(table.get(query).map(|&id| SearchHit {
            id,
            title: query.to_string(),
            date: Some("2021-01-01".into()),
        }))
    }

    async fn details(
        &self,
        id: u64,
        _kind: MediaKind,
    ) -> Result<Option<TitleDetails>, Self::Error> {
        if self.failing_details.contains(&id) {
            return Err(std::io::Error::other("catalog unavailable"));
        }
        Ok(Some(TitleDetails {
            id,
            title: format!("title-{id}"),
            release_date: Some("2021-01-01".into()),
            companies: self.companies.get(&id).cloned().unwrap_or_default(),
            networks: self.networks.get(&id).cloned().unwrap_or_default(),
        }))
    }
}
