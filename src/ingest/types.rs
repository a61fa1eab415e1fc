// src/ingest/types.rs

/// One entry as handed over by a feed parser, before normalization.
/// Every field is optional; the normalizer is the single place that
/// applies defaulting.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
}

/// Classified fetch failure. Every variant counts against the source's
/// health record the same way; the split drives logs and the retry
/// policy (only `Timeout` is retried).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network-level trouble: connection failure, non-2xx.
    #[error("transient fetch error: {0}")]
    Transient(String),
    /// The request ran past its deadline.
    #[error("fetch timeout: {0}")]
    Timeout(String),
    /// The body came back but could not be parsed into entries.
    #[error("feed parse error: {0}")]
    Parse(String),
}

/// Boundary to the network transport. Implementations own their retry
/// policy (at most one retry on timeout) and timeout budget.
#[async_trait::async_trait]
pub trait FetchAdapter: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<Vec<RawEntry>, FetchError>;
}
