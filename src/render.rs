// src/render.rs
// Write-only artifacts, fully regenerated each run from the alive set
// and the health table. No decisions live here.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::collections::BTreeMap;
use std::path::Path;

use crate::health::SourceHealth;
use crate::model::Item;
use crate::store::write_atomic;

/// Render all four artifacts into `public_dir`.
pub fn render_all(
    public_dir: &Path,
    alive: &[Item],
    health: &BTreeMap<String, SourceHealth>,
    top_n: usize,
    now: DateTime<Utc>,
) -> Result<()> {
    let top = &alive[..alive.len().min(top_n)];
    write_atomic(&public_dir.join("index.html"), listing_html(top).as_bytes())?;
    write_atomic(
        &public_dir.join("feed.json"),
        serde_json::to_string_pretty(top)?.as_bytes(),
    )?;
    write_atomic(&public_dir.join("feed.xml"), atom_feed(top, now).as_bytes())?;
    write_atomic(&public_dir.join("status.html"), status_html(health).as_bytes())?;
    Ok(())
}

fn listing_html(items: &[Item]) -> String {
    let mut lis = String::new();
    for it in items {
        let summary: String = it.summary.chars().take(160).collect();
        lis.push_str(&format!(
            "<li><a href=\"{}\" target=\"_blank\">{}</a> <small>({})</small><br><em>{}</em></li>\n",
            encode_double_quoted_attribute(&it.link),
            encode_text(&it.title),
            encode_text(&it.source_domain),
            encode_text(&summary),
        ));
    }
    format!(
        "<!doctype html><meta charset=\"utf-8\"><title>InfoHub</title>\n\
<style>body{{font:14px/1.6 -apple-system,BlinkMacSystemFont,Segoe UI,Roboto,Helvetica,Arial;\
max-width:860px;margin:24px auto;padding:0 12px}}li{{margin:10px 0}}</style>\n\
<h1>InfoHub</h1>\n<ul>{lis}</ul>"
    )
}

fn atom_feed(items: &[Item], now: DateTime<Utc>) -> String {
    let mut entries = String::new();
    for it in items {
        entries.push_str(&format!(
            "  <entry>\n    <title>{}</title>\n    <link href=\"{}\"/>\n    \
<id>urn:infohub:{}</id>\n    <updated>{}</updated>\n    <summary>{}</summary>\n  </entry>\n",
            encode_text(&it.title),
            encode_double_quoted_attribute(&it.link),
            it.id,
            it.published.to_rfc3339_opts(SecondsFormat::Secs, true),
            encode_text(&it.summary),
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<feed xmlns=\"http://www.w3.org/2005/Atom\">\n  <title>InfoHub</title>\n  \
<id>urn:infohub:feed</id>\n  <updated>{}</updated>\n{entries}</feed>\n",
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

fn status_html(health: &BTreeMap<String, SourceHealth>) -> String {
    let mut rows = String::new();
    for (source, rec) in health {
        let last_success = rec
            .last_success
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "-".into());
        let last_error = rec
            .last_error
            .as_ref()
            .map(|e| {
                format!(
                    "{} {}",
                    e.ts.to_rfc3339_opts(SecondsFormat::Secs, true),
                    e.message
                )
            })
            .unwrap_or_else(|| "-".into());
        let disabled = rec
            .disabled_until
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "-".into());
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            encode_text(source),
            encode_text(&last_success),
            rec.consecutive_failures,
            encode_text(&last_error),
            encode_text(&disabled),
        ));
    }
    format!(
        "<!doctype html><meta charset=\"utf-8\"><title>InfoHub status</title>\n\
<style>table{{border-collapse:collapse}}td,th{{border:1px solid #ccc;padding:4px 8px;\
font:13px/1.4 monospace}}</style>\n<h1>Source health</h1>\n<table>\n\
<tr><th>source</th><th>last success</th><th>failures</th><th>last error</th>\
<th>disabled until</th></tr>\n{rows}</table>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item_id;
    use chrono::TimeZone;

    fn item(title: &str, link: &str) -> Item {
        Item {
            id: item_id(title, link, "a.test"),
            title: title.into(),
            link: link.into(),
            summary: "sum <tag> & co".into(),
            published: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            source: "https://a.test/feed".into(),
            source_domain: "a.test".into(),
        }
    }

    #[test]
    fn listing_escapes_markup() {
        let html = listing_html(&[item("A <b>bold</b> claim", "https://a.test/x?a=1&b=2")]);
        assert!(html.contains("A &lt;b&gt;bold&lt;/b&gt; claim"));
        assert!(html.contains("a=1&amp;b=2"));
        assert!(!html.contains("<b>bold</b>"));
    }

    #[test]
    fn atom_feed_has_one_entry_per_item() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let xml = atom_feed(&[item("A", "https://a.test/1"), item("B", "https://a.test/2")], now);
        assert_eq!(xml.matches("<entry>").count(), 2);
        assert!(xml.contains("<updated>2025-06-01T00:00:00Z</updated>"));
    }

    #[test]
    fn status_rows_cover_all_sources() {
        let mut health = BTreeMap::new();
        health.insert("https://a.test/feed".to_string(), SourceHealth::default());
        health.insert(
            "https://b.test/feed".to_string(),
            SourceHealth {
                consecutive_failures: 2,
                ..Default::default()
            },
        );
        let html = status_html(&health);
        assert_eq!(html.matches("<tr><td>").count(), 2);
    }

    #[test]
    fn render_all_writes_four_files(){
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        render_all(dir.path(), &[item("A", "https://a.test/1")], &BTreeMap::new(), 200, now)
            .unwrap();
        for name in ["index.html", "feed.json", "feed.xml", "status.html"] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
    }
}
