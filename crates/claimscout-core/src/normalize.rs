//! Title cleaning for catalog lookups.
//!
//! Scraped listing titles carry release noise: episode markers, language and
//! quality tags, years and bracketed annotations. The catalog search works far
//! better on the bare work title, so titles pass through a sequential cleaning
//! pipeline before they are sent to the catalog.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ── Regex patterns (compiled once) ──────────────────────────────

/// Season/episode markers in English and German.
static RE_SERIES_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)S\d{1,2}E\d{1,2}",
        r"(?i)\bS\d{1,2}\b",
        r"(?i)\bE\d{1,2}\b",
        r"(?i)Staffel\s+\d+",
        r"(?i)Season\s+\d+",
        r"(?i)Episode\s+\d+",
        r"(?i)Folge\s+\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Patterns that mark a title as a series. `E07` only needs a trailing boundary.
static RE_SERIES_SIGNALS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)S\d{1,2}E\d{1,2}",
        r"(?i)\bS\d{1,2}\b",
        r"(?i)Staffel\s+\d+",
        r"(?i)Season\s+\d+",
        r"(?i)Episode\s+\d+",
        r"(?i)Folge\s+\d+",
        r"(?i)E\d{1,2}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// `*ENGLISH*`, `[GERMAN]`, `(DE)`. Case-sensitive: only shouted tags.
static RE_LANGUAGE_TAGS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\*[A-Z]+\*", r"\[[A-Z]{2,}\]", r"\([A-Z]{2}\)"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static RE_QUALITY_TAGS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(720p|1080p|2160p|4K|8K)\b",
        r"(?i)\b(BluRay|BDRip|DVDRip|WEBRip|HDTV)\b",
        r"(?i)\b(x264|x265|HEVC|H\.264|H\.265)\b",
        r"(?i)\b(AAC|AC3|DTS|FLAC)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(20\d{2})\b").unwrap());

static RE_BRACKETED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\([^)]*\)", r"\[[^\]]*\]", r"\{[^}]*\}"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// A single letter left at the end by a truncated listing title ("Pappbecher t").
static RE_TRUNCATED_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+[a-z]\s*$").unwrap());

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static RE_BOUNDARY_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-:._]+|[\s\-:._]+$").unwrap());

static RE_NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

// ── Detection ───────────────────────────────────────────────────

/// Whether the raw title carries a season or episode marker.
pub fn is_likely_series(title: &str) -> bool {
    RE_SERIES_SIGNALS.iter().any(|re| re.is_match(title))
}

/// First year in 2000–2099 found in the raw title.
pub fn extract_year(title: &str) -> Option<String> {
    RE_YEAR
        .captures(title)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

// ── Cleaning pipeline ───────────────────────────────────────────

/// Clean a scraped title down to the bare work title.
///
/// Steps applied in order:
/// 1. Unicode NFKC (fullwidth → ASCII)
/// 2. Season/episode markers
/// 3. Language tags
/// 4. Quality, codec and audio tags
/// 5. Years 2000–2099
/// 6. Bracketed segments
/// 7. A trailing truncated single letter
/// 8. Whitespace collapse and boundary punctuation trim
pub fn clean_title(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let s: String = title.nfkc().collect();
    let s = strip_all(&s, &RE_SERIES_MARKERS);
    let s = strip_all(&s, &RE_LANGUAGE_TAGS);
    let s = strip_all(&s, &RE_QUALITY_TAGS);
    let s = RE_YEAR.replace_all(&s, "").into_owned();
    let s = strip_all(&s, &RE_BRACKETED);
    let s = RE_TRUNCATED_TAIL.replace(&s, "").into_owned();
    let s = collapse_whitespace(&s);
    RE_BOUNDARY_PUNCT.replace_all(&s, "").trim().to_string()
}

/// Last-resort cleaning: every character that is neither alphanumeric nor
/// whitespace becomes a space.
pub fn aggressive_clean(title: &str) -> String {
    let s = RE_NON_WORD.replace_all(title, " ");
    collapse_whitespace(&s)
}

fn strip_all(s: &str, patterns: &[Regex]) -> String {
    patterns
        .iter()
        .fold(s.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
}

/// Trim and collapse multiple whitespace runs to a single space.
fn collapse_whitespace(s: &str) -> String {
    RE_WHITESPACE.replace_all(s, " ").trim().to_string()
}
