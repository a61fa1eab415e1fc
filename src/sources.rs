// src/sources.rs
// Source list loading: two cadence tiers, plain lists plus minimal OPML.

use anyhow::{Context, Result};
use std::path::Path;

/// Which tier(s) of sources this run covers. Selected by the
/// `INFOHUB_RUN_MODE` environment variable so slow-moving sources can
/// run on a separate cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Core,
    Secondary,
    All,
}

impl RunMode {
    pub const ENV: &'static str = "INFOHUB_RUN_MODE";

    pub fn from_env() -> Self {
        match std::env::var(Self::ENV)
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "secondary" => RunMode::Secondary,
            "all" => RunMode::All,
            _ => RunMode::Core,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Core => "core",
            RunMode::Secondary => "secondary",
            RunMode::All => "all",
        }
    }
}

/// Load the source URLs for one run mode from `dir`.
///
/// Each tier reads `<tier>.txt` (one URL per line, `#` comments) and,
/// when present, `<tier>.opml` (only `xmlUrl="…"` attributes are
/// extracted). Order of first appearance is kept; duplicates are
/// dropped.
pub fn load_sources(dir: &Path, mode: RunMode) -> Result<Vec<String>> {
    let tiers: &[&str] = match mode {
        RunMode::Core => &["core"],
        RunMode::Secondary => &["secondary"],
        RunMode::All => &["core", "secondary"],
    };

    let mut urls = Vec::new();
    for tier in tiers {
        let txt = dir.join(format!("{tier}.txt"));
        let content = std::fs::read_to_string(&txt)
            .with_context(|| format!("reading source list {}", txt.display()))?;
        for line in content.lines() {
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                urls.push(line.to_string());
            }
        }

        let opml = dir.join(format!("{tier}.opml"));
        if opml.exists() {
            let content = std::fs::read_to_string(&opml)
                .with_context(|| format!("reading opml {}", opml.display()))?;
            urls.extend(extract_opml_urls(&content));
        }
    }

    let mut seen = std::collections::HashSet::new();
    urls.retain(|u| seen.insert(u.clone()));
    Ok(urls)
}

fn extract_opml_urls(opml: &str) -> Vec<String> {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = RE.get_or_init(|| regex::Regex::new(r#"xmlUrl="([^"]+)""#).unwrap());
    re.captures_iter(opml)
        .map(|c| c[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opml_urls_are_extracted() {
        let opml = r#"<opml><body>
            <outline text="A" xmlUrl="https://a.test/rss"/>
            <outline text="B" xmlUrl="https://b.test/rss" htmlUrl="https://b.test"/>
        </body></opml>"#;
        assert_eq!(
            extract_opml_urls(opml),
            vec!["https://a.test/rss", "https://b.test/rss"]
        );
    }

    #[test]
    fn tiers_load_in_order_and_dedup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("core.txt"),
            "# core sources\nhttps://a.test/rss\nhttps://b.test/rss\n\nhttps://a.test/rss\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("secondary.txt"), "https://c.test/rss\n").unwrap();

        let core = load_sources(dir.path(), RunMode::Core).unwrap();
        assert_eq!(core, vec!["https://a.test/rss", "https://b.test/rss"]);

        let all = load_sources(dir.path(), RunMode::All).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2], "https://c.test/rss");
    }

    #[test]
    fn missing_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_sources(dir.path(), RunMode::Core).is_err());
    }
}
