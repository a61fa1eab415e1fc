// src/ingest/fetch.rs
// HTTP transport + feed parsing behind the FetchAdapter boundary.

use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::types::{FetchAdapter, FetchError, RawEntry};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}
#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    summary: Option<String>,
    content: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

/// Parse a feed body into raw entries. The root element decides the
/// dialect (`<rss>` vs `<feed>`); anything else is a
/// [`FetchError::Parse`].
pub fn parse_feed(body: &str) -> Result<Vec<RawEntry>, FetchError> {
    let t0 = std::time::Instant::now();
    let out = if body.contains("<rss") {
        let rss: Rss =
            from_str(body).map_err(|e| FetchError::Parse(format!("rss: {e}")))?;
        rss.channel
            .item
            .into_iter()
            .map(|it| RawEntry {
                title: it.title,
                link: it.link,
                summary: None,
                description: it.description,
                published: it.pub_date,
                updated: None,
            })
            .collect()
    } else if body.contains("<feed") {
        let atom: AtomFeed =
            from_str(body).map_err(|e| FetchError::Parse(format!("atom: {e}")))?;
        atom.entry
            .into_iter()
            .map(|e| RawEntry {
                title: e.title,
                link: e.link.into_iter().find_map(|l| l.href),
                summary: e.summary,
                description: e.content,
                published: e.published,
                updated: e.updated,
            })
            .collect()
    } else {
        return Err(FetchError::Parse("unrecognized feed format".into()));
    };
    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    Ok(out)
}

/// reqwest-backed adapter: bounded timeout, one automatic retry on
/// timeout, then the failure is recorded against the source.
pub struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("infohub/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Transient(format!("http status {status}")));
        }
        resp.text().await.map_err(classify_reqwest)
    }
}

fn classify_reqwest(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(e.to_string())
    } else {
        FetchError::Transient(e.to_string())
    }
}

/// One automatic retry, on timeout only. A second timeout (or any
/// other failure) surfaces to the caller and is recorded against the
/// source's health.
async fn get_with_one_retry<F, Fut>(source: &str, get: F) -> Result<String, FetchError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<String, FetchError>>,
{
    match get().await {
        Ok(body) => Ok(body),
        Err(FetchError::Timeout(_)) => {
            tracing::debug!(target: "ingest", source, "timeout, retrying once");
            counter!("ingest_fetch_retries_total").increment(1);
            get().await
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl FetchAdapter for FeedFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<RawEntry>, FetchError> {
        let body = get_with_one_retry(source, || self.get_body(source)).await?;
        parse_feed(&body)
    }
}

/// In-memory adapter for tests and fixtures: serves a canned body per
/// source; unknown sources fail transiently.
pub struct FixtureFetcher {
    bodies: std::collections::HashMap<String, String>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self {
            bodies: std::collections::HashMap::new(),
        }
    }

    pub fn with_body(mut self, source: &str, body: &str) -> Self {
        self.bodies.insert(source.to_string(), body.to_string());
        self
    }
}

impl Default for FixtureFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchAdapter for FixtureFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<RawEntry>, FetchError> {
        match self.bodies.get(source) {
            Some(body) => parse_feed(body),
            None => Err(FetchError::Transient(format!("no fixture for {source}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
<item><title>First</title><link>https://a.test/1</link>
<pubDate>Sun, 01 Jun 2025 00:00:00 GMT</pubDate>
<description>&lt;p&gt;Body&lt;/p&gt;</description></item>
<item><title>Second</title><link>https://a.test/2</link></item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>T</title>
<entry><title>Entry</title><link href="https://b.test/1"/>
<updated>2025-06-01T00:00:00Z</updated><summary>S</summary></entry>
</feed>"#;

    #[test]
    fn rss_items_map_to_raw_entries() {
        let entries = parse_feed(RSS).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("First"));
        assert_eq!(entries[0].published.as_deref(), Some("Sun, 01 Jun 2025 00:00:00 GMT"));
        assert!(entries[1].published.is_none());
    }

    #[test]
    fn atom_entries_map_to_raw_entries() {
        let entries = parse_feed(ATOM).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link.as_deref(), Some("https://b.test/1"));
        assert_eq!(entries[0].updated.as_deref(), Some("2025-06-01T00:00:00Z"));
        assert_eq!(entries[0].summary.as_deref(), Some("S"));
    }

    #[test]
    fn non_feed_body_is_a_parse_error() {
        let err = parse_feed("<html><body>404</body></html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn timeout_is_retried_exactly_once() {
        let calls = AtomicUsize::new(0);
        let body = get_with_one_retry("https://a.test/rss", || async {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(FetchError::Timeout("deadline elapsed".into())),
                _ => Ok(RSS.to_string()),
            }
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(body.contains("<rss"));
    }

    #[tokio::test]
    async fn second_timeout_is_a_failure() {
        let calls = AtomicUsize::new(0);
        let err = get_with_one_retry("https://a.test/rss", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(FetchError::Timeout("deadline elapsed".into()))
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn non_timeout_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let err = get_with_one_retry("https://a.test/rss", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(FetchError::Transient("connection refused".into()))
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, FetchError::Transient(_)));
    }
}
