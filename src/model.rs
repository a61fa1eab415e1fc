// src/model.rs
// Shared data model for the ingestion pipeline.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// One deduplicated, normalized unit of syndicated content.
///
/// `id` is the sole deduplication key; see [`item_id`] for how it is
/// derived. `published` is always UTC; entries whose timestamp could
/// not be parsed carry the instant of normalization instead.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: DateTime<Utc>,
    pub source: String,
    pub source_domain: String,
}

impl Item {
    /// Title and summary joined for keyword matching, the same text the
    /// rule filter and the expiry classifier both look at.
    pub fn matchable_text(&self) -> String {
        format!("{} {}", self.title, self.summary)
    }
}

/// Stable identity over (title, link, source_domain).
///
/// Hex digest of the UTF-8 bytes `title|link|domain`. Two entries that
/// agree on all three always collapse to the same id, across runs and
/// across processes.
pub fn item_id(title: &str, link: &str, source_domain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(link.as_bytes());
    hasher.update(b"|");
    hasher.update(source_domain.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Observability record for one completed run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    pub ts: DateTime<Utc>,
    pub run_mode: String,
    pub sources_total: usize,
    pub sources_fetched: usize,
    pub sources_skipped: usize,
    pub sources_failed: usize,
    pub candidates: usize,
    pub alive: usize,
    pub new_items: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        let a = item_id("Bridge closure", "https://x.test/a", "x.test");
        let b = item_id("Bridge closure", "https://x.test/a", "x.test");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn id_ignores_summary_but_not_title() {
        let a = item_id("T", "L", "D");
        let b = item_id("T2", "L", "D");
        assert_ne!(a, b);
    }

    #[test]
    fn delimiter_prevents_field_bleed() {
        // ("ab", "c") and ("a", "bc") must not collide
        let a = item_id("ab", "c", "d");
        let b = item_id("a", "bc", "d");
        assert_ne!(a, b);
    }
}
