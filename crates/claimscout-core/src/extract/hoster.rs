//! Best-effort hoster names for extracted links.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

pub const UNKNOWN_HOSTER: &str = "Unknown";

static RE_WWW_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^www\d?\.").unwrap());
static RE_HOSTER_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Hoster\s+(\w+)").unwrap());

static SEL_H4: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h4").unwrap());
static SEL_ICON: LazyLock<Selector> = LazyLock::new(|| Selector::parse("i.icon").unwrap());
static SEL_HOST_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#".hostName, [class*="host"]"#).unwrap());

const ICON_CLASSES: &[&str] = &["icon", "fa", "fas"];

/// Derive a hoster name from the second-level domain: `https://www.voe.sx/e/1` → `Voe`.
pub fn hoster_from_url(url: &str) -> String {
    let Some(host) = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    else {
        return UNKNOWN_HOSTER.to_string();
    };

    let host = RE_WWW_LABEL.replace(&host, "");
    let parts: Vec<&str> = host.split('.').collect();
    let name = if parts.len() >= 2 {
        parts[parts.len() - 2]
    } else {
        parts[0]
    };

    if name.is_empty() {
        UNKNOWN_HOSTER.to_string()
    } else {
        capitalize(name)
    }
}

/// Hoster label of a redirect-marker link.
///
/// Cascade: `h4` text → `i.icon` title ("Hoster VOE") → icon class name →
/// first line of the link text → [`UNKNOWN_HOSTER`].
pub fn hoster_from_marker_link(link: ElementRef<'_>) -> String {
    if let Some(h4) = link.select(&SEL_H4).next() {
        let text = element_text(h4);
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(icon) = link.select(&SEL_ICON).next() {
        if let Some(caps) = icon.attr("title").and_then(|t| RE_HOSTER_TITLE.captures(t)) {
            return caps[1].to_string();
        }
        if let Some(class) = icon.attr("class") {
            if let Some(name) = class
                .split_whitespace()
                .find(|c| !ICON_CLASSES.contains(&c.to_lowercase().as_str()))
            {
                return capitalize(name);
            }
        }
    }

    element_text(link)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_HOSTER.to_string())
}

/// Hoster label near a tagged element: a `.hostName`-like node under its
/// grandparent, with "HD" markers removed. Falls back to the URL.
pub fn hoster_near_element(element: ElementRef<'_>, url: &str) -> String {
    let label = element
        .parent()
        .and_then(|p| p.parent())
        .and_then(ElementRef::wrap)
        .and_then(|gp| gp.select(&SEL_HOST_LABEL).next())
        .map(|node| element_text(node).replace(" HD", "").replace("HD", "").trim().to_string())
        .filter(|s| !s.is_empty());

    label.unwrap_or_else(|| hoster_from_url(url))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Uppercase the first character, lowercase the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
