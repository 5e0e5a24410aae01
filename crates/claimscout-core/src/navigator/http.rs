use std::time::Duration;

use reqwest::Client;

use super::{BrowsingContext, Navigator, Page};
use crate::config::ScanConfig;
use crate::error::NavError;

const MAX_REDIRECTS: usize = 10;

/// Connection settings for [`HttpNavigator`].
#[derive(Debug, Clone)]
pub struct NavigatorSettings {
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl NavigatorSettings {
    pub fn from_config(scan: &ScanConfig) -> Self {
        Self {
            request_timeout: scan.request_timeout(),
            user_agent: scan.user_agent.clone(),
        }
    }
}

/// Navigator backed by a plain HTTP client. Markup is taken as served;
/// scripts are not executed.
pub struct HttpNavigator {
    settings: NavigatorSettings,
    client: Option<Client>,
}

impl HttpNavigator {
    pub fn new(settings: NavigatorSettings) -> Self {
        Self {
            settings,
            client: None,
        }
    }

    fn client(&self) -> Result<&Client, NavError> {
        self.client.as_ref().ok_or(NavError::NotStarted)
    }
}

impl Navigator for HttpNavigator {
    type Context = HttpContext;

    async fn start(&mut self) -> Result<(), NavError> {
        if self.client.is_some() {
            return Ok(());
        }
        let client = Client::builder()
            .timeout(self.settings.request_timeout)
            .user_agent(&self.settings.user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| NavError::Unavailable(e.to_string()))?;
        self.client = Some(client);
        tracing::debug!("HTTP navigator started");
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Option<Page>, NavError> {
        let client = self.client()?;

        let response = match client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url, error = %e, "Page load failed");
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Page returned error status");
            return Ok(None);
        }

        let final_url = response.url().to_string();
        match response.text().await {
            Ok(html) => Ok(Some(Page::new(final_url, html))),
            Err(e) => {
                tracing::warn!(url, error = %e, "Failed to read page body");
                Ok(None)
            }
        }
    }

    async fn open_context(&self) -> Result<HttpContext, NavError> {
        Ok(HttpContext::new(self.client()?.clone()))
    }

    async fn stop(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("HTTP navigator stopped");
        }
    }
}

/// Auxiliary context holding the last page it navigated to.
pub struct HttpContext {
    client: Client,
    current_url: String,
    body: String,
}

impl HttpContext {
    fn new(client: Client) -> Self {
        Self {
            client,
            current_url: String::new(),
            body: String::new(),
        }
    }
}

impl BrowsingContext for HttpContext {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), NavError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NavError::Timeout(url.to_string())
                } else {
                    NavError::Http(e)
                }
            })?;

        self.current_url = response.url().to_string();
        self.body = response.text().await?;
        Ok(())
    }

    async fn content(&self) -> Result<String, NavError> {
        Ok(self.body.clone())
    }

    fn current_url(&self) -> String {
        self.current_url.clone()
    }

    async fn close(self) {
        tracing::trace!(url = %self.current_url, "Context closed");
    }
}
