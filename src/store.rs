// src/store.rs
// Durable state on disk. Everything rewritten per run goes through
// write-temp-then-rename so a crash never leaves a half-written document.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::health::SourceHealth;
use crate::model::{Item, RunSummary};

pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn latest_dir(&self) -> PathBuf {
        self.data_dir.join("latest")
    }

    fn index_path(&self) -> PathBuf {
        self.latest_dir().join("index.json")
    }

    fn health_path(&self) -> PathBuf {
        self.latest_dir().join("health.json")
    }

    /// Previous rolling index; empty on first run.
    pub fn load_index(&self) -> Result<Vec<Item>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Replace the rolling index atomically.
    pub fn save_index(&self, items: &[Item]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        write_atomic(&self.index_path(), json.as_bytes())
    }

    /// Persisted health records; empty on first run.
    pub fn load_health(&self) -> Result<BTreeMap<String, SourceHealth>> {
        let path = self.health_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save_health(&self, records: &BTreeMap<String, SourceHealth>) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        write_atomic(&self.health_path(), json.as_bytes())
    }

    /// Append every normalized item seen this run to the per-month
    /// audit archive. One JSON object per line, never rewritten, never
    /// deduplicated across runs.
    pub fn append_archive(&self, items: &[Item], now: DateTime<Utc>) -> Result<()> {
        let dir = self.data_dir.join("archive").join(now.format("%Y-%m").to_string());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join("snapshot.ndjson");
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        for it in items {
            serde_json::to_writer(&mut f, it)?;
            f.write_all(b"\n")?;
        }
        Ok(())
    }

    /// One line per completed run, for observability.
    pub fn append_run_summary(&self, summary: &RunSummary) -> Result<()> {
        std::fs::create_dir_all(self.latest_dir())?;
        let path = self.latest_dir().join("runs.ndjson");
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        serde_json::to_writer(&mut f, summary)?;
        f.write_all(b"\n")?;
        Ok(())
    }
}

/// Write to `<path>.tmp` in the same directory, then rename over the
/// target. Rename within one filesystem is atomic.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("no parent dir for {}", path.display()))?;
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let tmp = path.with_extension("tmp");
    {
        let mut f = std::fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} over {}", tmp.display(), path.display()))?;
    Ok(())
}
