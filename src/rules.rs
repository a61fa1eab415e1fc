// src/rules.rs
// Keyword rule sets: whitelist, blacklist, persistent domains.
// Loaded once per run from line-delimited files; immutable afterwards.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

use crate::model::Item;

/// Immutable per-run rule configuration.
///
/// Matching is plain substring containment, no tokenization and no case
/// folding; the lists are expected to already be in the matching script
/// and case.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub whitelist: BTreeSet<String>,
    pub blacklist: BTreeSet<String>,
    pub persistent_domains: BTreeSet<String>,
}

impl RuleSet {
    /// Load the three rule files from a directory
    /// (`whitelist.txt`, `blacklist.txt`, `persistent_domains.txt`).
    ///
    /// A missing file is an error unless `allow_missing` is set, in
    /// which case it yields an empty set (empty whitelist = no
    /// restriction, empty blacklist = nothing rejected).
    pub fn load_from_dir(dir: &Path, allow_missing: bool) -> Result<Self> {
        Ok(Self {
            whitelist: load_keyword_file(&dir.join("whitelist.txt"), allow_missing)?,
            blacklist: load_keyword_file(&dir.join("blacklist.txt"), allow_missing)?,
            persistent_domains: load_keyword_file(
                &dir.join("persistent_domains.txt"),
                allow_missing,
            )?,
        })
    }

    /// Whitelist/blacklist decision for one item.
    ///
    /// Empty whitelist admits any text; a blacklist hit rejects even
    /// when a whitelist term also matched.
    pub fn passes(&self, item: &Item) -> bool {
        let text = item.matchable_text();
        if !self.whitelist.is_empty() && !self.whitelist.iter().any(|k| text.contains(k.as_str())) {
            return false;
        }
        !self.blacklist.iter().any(|k| text.contains(k.as_str()))
    }

    /// True iff `domain` equals, or is a subdomain of (dot-boundary
    /// suffix), any entry in the persistent-domain set.
    pub fn is_persistent_domain(&self, domain: &str) -> bool {
        self.persistent_domains.iter().any(|d| {
            domain == d
                || (domain.len() > d.len()
                    && domain.ends_with(d.as_str())
                    && domain.as_bytes()[domain.len() - d.len() - 1] == b'.')
        })
    }
}

/// One keyword per line; blank lines and `#` comments are skipped.
fn load_keyword_file(path: &Path, allow_missing: bool) -> Result<BTreeSet<String>> {
    if allow_missing && !path.exists() {
        return Ok(BTreeSet::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading rule file {}", path.display()))?;
    Ok(parse_keyword_lines(&content))
}

pub fn parse_keyword_lines(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
