//! Resolution of intermediate redirect pages to their final hoster URL.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::{Html, Selector};

use super::is_valid_url;
use crate::error::NavError;
use crate::navigator::{BrowsingContext, Navigator};

/// Embedded player frames, matched by id only.
const PLAYER_FRAME_SELECTORS: &[&str] = &["iframe#bs_player", "iframe#player"];

/// One way a redirect page can announce its target in its source.
pub struct RedirectHeuristic {
    pub name: &'static str,
    pattern: Regex,
}

impl RedirectHeuristic {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    /// The last valid match in `source`. Pages usually assign a storage-based
    /// target first and the plain fallback last.
    pub fn find(&self, source: &str) -> Option<String> {
        self.pattern
            .captures_iter(source)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|url| is_valid_url(url))
            .last()
            .map(str::to_string)
    }
}

/// Redirect heuristics in rank order. The first one with a valid match wins.
pub static REDIRECT_HEURISTICS: LazyLock<Vec<RedirectHeuristic>> = LazyLock::new(|| {
    vec![
        RedirectHeuristic::new(
            "window.location.href",
            r#"window\.location\.href\s*=\s*['"]([^'"]+)['"]"#,
        ),
        RedirectHeuristic::new("location.href", r#"location\.href\s*=\s*['"]([^'"]+)['"]"#),
        RedirectHeuristic::new(
            "window.location",
            r#"window\.location\s*=\s*['"]([^'"]+)['"]"#,
        ),
        RedirectHeuristic::new(
            "location.replace",
            r#"location\.replace\(\s*['"]([^'"]+)['"]\s*\)"#,
        ),
        RedirectHeuristic::new(
            "location.assign",
            r#"location\.assign\(\s*['"]([^'"]+)['"]\s*\)"#,
        ),
        RedirectHeuristic::new(
            "meta refresh",
            r#"(?i)<meta[^>]+http-equiv=["']?refresh["']?[^>]*content=["'][^"']*?url=([^"'>\s]+)"#,
        ),
    ]
});

/// Run the ranked heuristics over a page source.
pub fn parse_redirect(source: &str) -> Option<String> {
    REDIRECT_HEURISTICS.iter().find_map(|h| {
        let found = h.find(source);
        if found.is_some() {
            tracing::trace!(heuristic = h.name, "Redirect target found");
        }
        found
    })
}

/// Source of the first known embedded player frame.
fn player_frame_source(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    PLAYER_FRAME_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .flat_map(|sel| {
            doc.select(&sel)
                .filter_map(|el| el.attr("src").map(str::to_string))
                .collect::<Vec<_>>()
        })
        .find(|src| is_valid_url(src))
}

/// Pick the resolved target from a loaded redirect page: player frame,
/// then the source heuristics, then the final URL if navigation moved.
pub fn resolve_from_source(source: &str, final_url: &str, requested_url: &str) -> Option<String> {
    if let Some(src) = player_frame_source(source) {
        return Some(src);
    }
    if let Some(target) = parse_redirect(source) {
        return Some(target);
    }
    (final_url != requested_url && is_valid_url(final_url)).then(|| final_url.to_string())
}

/// Follow one redirect link in an auxiliary context.
///
/// Non-fatal failures (timeouts, HTTP errors) are logged and yield `None`.
/// The context is closed on every path.
pub async fn resolve_redirect<N: Navigator>(
    navigator: &N,
    url: &str,
    timeout: Duration,
    settle: Duration,
) -> Result<Option<String>, NavError> {
    let mut ctx = match navigator.open_context().await {
        Ok(ctx) => ctx,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            tracing::warn!(url, error = %e, "Could not open redirect context");
            return Ok(None);
        }
    };

    let outcome = follow(&mut ctx, url, timeout, settle).await;
    ctx.close().await;

    match outcome {
        Ok(target) => Ok(target),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!(url, error = %e, "Redirect follow failed");
            Ok(None)
        }
    }
}

async fn follow<C: BrowsingContext>(
    ctx: &mut C,
    url: &str,
    timeout: Duration,
    settle: Duration,
) -> Result<Option<String>, NavError> {
    tokio::time::timeout(timeout, ctx.goto(url, timeout))
        .await
        .map_err(|_| NavError::Timeout(url.to_string()))??;
    tokio::time::sleep(settle).await;

    let source = ctx.content().await?;
    Ok(resolve_from_source(&source, &ctx.current_url(), url))
}
