use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::ScanError;
use crate::models::LinkRecord;

const SCHEMA: &str = include_str!("../../../migrations/001_initial.sql");

/// Host key used when a URL cannot be parsed.
const UNKNOWN_HOST: &str = "unknown";

/// SQLite-backed append-only store of verified video links.
pub struct Storage {
    conn: Connection,
}

/// A persisted link row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LinkRow {
    pub id: i64,
    pub company: String,
    pub host: String,
    pub url: String,
    pub website: String,
    pub inserted_at: DateTime<Utc>,
}

/// Anything that can be stored as a link: extracted records, bare URLs, or
/// loosely shaped JSON (`{"url": ..}`, `{"link": ..}` or a plain string).
pub trait LinkSource {
    fn link_url(&self) -> Option<String>;
}

impl LinkSource for LinkRecord {
    fn link_url(&self) -> Option<String> {
        Some(self.url.clone())
    }
}

impl LinkSource for &str {
    fn link_url(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl LinkSource for String {
    fn link_url(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl LinkSource for serde_json::Value {
    fn link_url(&self) -> Option<String> {
        match self {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => ["url", "link"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
                .map(str::to_string),
            _ => None,
        }
    }
}

impl Storage {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, ScanError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ── Writes ──────────────────────────────────────────────────

    /// Append one row per usable link, returning how many were written.
    ///
    /// Entries without a URL and rows the database rejects are logged and
    /// skipped; the rest of the batch is still written.
    pub fn insert_links<L: LinkSource>(
        &self,
        company: &str,
        links: &[L],
        website: &str,
    ) -> Result<usize, ScanError> {
        if links.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO streaming_links (company, host, url, website, inserted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for link in links {
                let Some(url) = link.link_url().filter(|u| !u.is_empty()) else {
                    tracing::warn!(company, "Skipping link without URL");
                    continue;
                };
                let host = host_key(&url);
                match stmt.execute(params![company, host, url, website, now]) {
                    Ok(_) => inserted += 1,
                    Err(e) => tracing::warn!(url = %url, error = %e, "Failed to insert link"),
                }
            }
        }

        tx.commit()?;
        tracing::debug!(company, website, inserted, "Links persisted");
        Ok(inserted)
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn link_count(&self) -> Result<u64, ScanError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM streaming_links", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// All rows stored for one rights holder, oldest first.
    pub fn links_by_company(&self, company: &str) -> Result<Vec<LinkRow>, ScanError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company, host, url, website, inserted_at
             FROM streaming_links WHERE company = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![company], |row| {
                let inserted_at: String = row.get(5)?;
                Ok(LinkRow {
                    id: row.get(0)?,
                    company: row.get(1)?,
                    host: row.get(2)?,
                    url: row.get(3)?,
                    website: row.get(4)?,
                    inserted_at: parse_datetime(&inserted_at),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Row counts per company, largest first.
    pub fn company_counts(&self) -> Result<Vec<(String, u64)>, ScanError> {
        let mut stmt = self.conn.prepare(
            "SELECT company, COUNT(*) FROM streaming_links
             GROUP BY company ORDER BY COUNT(*) DESC, company",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, count as u64))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}

// ── Helpers ─────────────────────────────────────────────────────

/// Host (with port, if any) minus one leading `www.` label.
pub fn host_key(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return UNKNOWN_HOST.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return UNKNOWN_HOST.to_string();
    };
    let host = host.strip_prefix("www.").unwrap_or(host);
    match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key() {
        assert_eq!(host_key("https://www.voe.sx/e/1"), "voe.sx");
        assert_eq!(host_key("https://streamtape.com/e/2"), "streamtape.com");
        assert_eq!(host_key("https://www.www.example.org/"), "www.example.org");
        assert_eq!(host_key("http://dood.watch:8080/e/3"), "dood.watch:8080");
        assert_eq!(host_key("garbage"), UNKNOWN_HOST);
    }

    #[test]
    fn test_insert_records() {
        let storage = Storage::open_memory().unwrap();
        let links = vec![
            LinkRecord::new("https://www.voe.sx/e/1", "Voe"),
            LinkRecord::new("https://streamtape.com/e/2", "Streamtape"),
        ];
        let inserted = storage
            .insert_links("Walt Disney Pictures", &links, "filmpalast.to")
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(storage.link_count().unwrap(), 2);

        let rows = storage.links_by_company("Walt Disney Pictures").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].host, "voe.sx");
        assert_eq!(rows[0].website, "filmpalast.to");
        assert_eq!(rows[1].url, "https://streamtape.com/e/2");
        assert!(rows[0].inserted_at > DateTime::<Utc>::default());
    }

    #[test]
    fn test_empty_batch() {
        let storage = Storage::open_memory().unwrap();
        let none: Vec<LinkRecord> = Vec::new();
        assert_eq!(storage.insert_links("Pixar", &none, "bs.to").unwrap(), 0);
        assert_eq!(storage.link_count().unwrap(), 0);
    }

    #[test]
    fn test_loose_json_entries() {
        let storage = Storage::open_memory().unwrap();
        let links = vec![
            serde_json::json!({"url": "https://voe.sx/e/1"}),
            serde_json::json!({"link": "https://mixdrop.co/e/2"}),
            serde_json::json!("https://dood.watch/e/3"),
            serde_json::json!({"hoster": "nothing"}),
            serde_json::json!(42),
        ];
        assert_eq!(storage.insert_links("Marvel Studios", &links, "bs.to").unwrap(), 3);
    }

    #[test]
    fn test_plain_strings() {
        let storage = Storage::open_memory().unwrap();
        let links = ["https://voe.sx/e/1", ""];
        assert_eq!(storage.insert_links("Pixar", &links, "bs.to").unwrap(), 1);
    }

    #[test]
    fn test_append_only() {
        let storage = Storage::open_memory().unwrap();
        let links = vec!["https://voe.sx/e/1".to_string()];
        storage.insert_links("Pixar", &links, "bs.to").unwrap();
        storage.insert_links("Pixar", &links, "bs.to").unwrap();
        storage.insert_links("Marvel Studios", &links, "bs.to").unwrap();
        assert_eq!(storage.link_count().unwrap(), 3);
        assert_eq!(
            storage.company_counts().unwrap(),
            vec![("Pixar".to_string(), 2), ("Marvel Studios".to_string(), 1)]
        );
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.db");
        {
            let storage = Storage::open(&path).unwrap();
            storage
                .insert_links("Pixar", &["https://voe.sx/e/1"], "bs.to")
                .unwrap();
        }
        let reopened = Storage::open(&path).unwrap();
        assert_eq!(reopened.link_count().unwrap(), 1);
    }
}
