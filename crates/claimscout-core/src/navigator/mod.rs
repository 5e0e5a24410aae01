//! Page navigation.
//!
//! The scan pipeline loads pages through a [`Navigator`], an owned resource
//! that is started once per run and stopped on completion or unwind. Redirect
//! resolution opens short-lived auxiliary [`BrowsingContext`]s from it.

mod http;

use std::future::Future;
use std::time::Duration;

pub use http::{HttpContext, HttpNavigator, NavigatorSettings};

use crate::error::NavError;

/// A fetched page: the URL it was finally served from and its markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub html: String,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Loads pages for the scan pipeline.
pub trait Navigator: Send + Sync {
    type Context: BrowsingContext;

    /// Acquire the underlying engine. Failure is fatal for the run.
    fn start(&mut self) -> impl Future<Output = Result<(), NavError>> + Send;

    /// Load a page. `Ok(None)` is a transient failure that has already been logged.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Option<Page>, NavError>> + Send;

    /// Open an auxiliary context for a single redirect resolution.
    fn open_context(&self) -> impl Future<Output = Result<Self::Context, NavError>> + Send;

    /// Release the engine. Safe to call more than once.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}

/// A short-lived page context, released with [`BrowsingContext::close`].
pub trait BrowsingContext: Send {
    fn goto(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), NavError>> + Send;

    /// Markup of the currently loaded page.
    fn content(&self) -> impl Future<Output = Result<String, NavError>> + Send;

    /// URL of the currently loaded page after redirects.
    fn current_url(&self) -> String;

    fn close(self) -> impl Future<Output = ()> + Send;
}
