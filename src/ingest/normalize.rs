// src/ingest/normalize.rs
// RawEntry -> Item: text cleaning, timestamp parsing, identity.

use chrono::{DateTime, Utc};
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::types::RawEntry;
use crate::model::{item_id, Item};

/// Strip HTML tags, decode entities, collapse whitespace.
pub fn html_to_text(s: &str) -> String {
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    let mut out = re_tags.replace_all(s, " ").to_string();

    out = html_escape::decode_html_entities(&out).to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Host portion of a source URL, lower-cased, scheme/path/port
/// stripped. Bracketed IPv6 literals lose their brackets.
pub fn source_domain(source: &str) -> String {
    let rest = source
        .strip_prefix("https://")
        .or_else(|| source.strip_prefix("http://"))
        .unwrap_or(source);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = host.split('@').next_back().unwrap_or(host);
    // the port split must not eat into a [v6] literal
    let host = match host.strip_prefix('[') {
        Some(v6) => v6.split(']').next().unwrap_or(v6),
        None => host.split(':').next().unwrap_or(host),
    };
    host.to_ascii_lowercase()
}

/// Feed timestamps arrive in either RFC 2822 (RSS `pubDate`) or
/// RFC 3339 (Atom `updated`). Anything else is unparseable.
pub fn parse_feed_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let parsed = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()?;
    DateTime::<Utc>::from_timestamp(parsed.unix_timestamp(), parsed.nanosecond())
}

/// Build the canonical [`Item`] for one raw entry. Pure: `now` is the
/// caller's clock, substituted when the entry carries no parseable
/// timestamp.
pub fn normalize(source: &str, entry: &RawEntry, now: DateTime<Utc>) -> Item {
    let title = entry.title.as_deref().unwrap_or("").trim().to_string();
    let link = entry.link.as_deref().unwrap_or("").trim().to_string();

    let summary_raw = entry
        .summary
        .as_deref()
        .or(entry.description.as_deref())
        .unwrap_or("");
    let summary = html_to_text(summary_raw);

    let ts_raw = entry.published.as_deref().or(entry.updated.as_deref());
    let published = match ts_raw {
        Some(ts) => parse_feed_timestamp(ts).unwrap_or_else(|| {
            // Degraded data: the fallback makes the item near-fresh,
            // which extends its effective lifetime.
            tracing::warn!(target: "ingest", source, ts, "unparseable timestamp, using now");
            now
        }),
        None => now,
    };

    let domain = source_domain(source);
    Item {
        id: item_id(&title, &link, &domain),
        title,
        link,
        summary,
        published,
        source: source.to_string(),
        source_domain: domain,
    }
}
