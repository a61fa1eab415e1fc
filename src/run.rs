// src/run.rs
// One full run: load state, gather, reconcile, persist, render.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::config::Settings;
use crate::health::HealthTable;
use crate::ingest::{self, types::FetchAdapter};
use crate::model::RunSummary;
use crate::reconcile;
use crate::render;
use crate::rules::RuleSet;
use crate::sources::{self, RunMode};
use crate::store::Store;

/// Execute one complete run with the given adapter.
///
/// Per-source failures are absorbed into the health table; the run
/// itself fails only on configuration or durable-storage errors.
pub async fn run_once(
    settings: &Settings,
    mode: RunMode,
    adapter: &dyn FetchAdapter,
) -> Result<RunSummary> {
    let now = Utc::now();
    let deadline = settings
        .run_deadline_secs
        .map(|s| now + chrono::Duration::seconds(s as i64));

    let rules = RuleSet::load_from_dir(&settings.rules_dir, settings.allow_missing_rules)
        .context("loading rule files")?;
    let source_list =
        sources::load_sources(&settings.sources_dir, mode).context("loading source lists")?;

    let store = Store::new(&settings.data_dir);
    let previous = store.load_index().context("loading rolling index")?;
    let mut health = HealthTable::from_records(
        store.load_health().context("loading health table")?,
        settings.disable_threshold,
        settings.cooldown(),
    );

    let (candidates, stats) =
        ingest::gather_candidates(adapter, &source_list, &rules, &mut health, now, deadline).await;

    store
        .append_archive(&candidates, now)
        .context("appending archive")?;
    let candidate_count = candidates.len();

    let policy = settings.expiry_policy();
    let outcome = reconcile::reconcile(&previous, candidates, &rules, &policy, now);

    store.save_index(&outcome.alive).context("saving rolling index")?;
    let records = health.into_records();
    store.save_health(&records).context("saving health table")?;

    render::render_all(&settings.public_dir, &outcome.alive, &records, settings.top_n, now)
        .context("rendering outputs")?;

    let summary = RunSummary {
        ts: now,
        run_mode: mode.as_str().to_string(),
        sources_total: stats.sources_total,
        sources_fetched: stats.sources_fetched,
        sources_skipped: stats.sources_skipped,
        sources_failed: stats.sources_failed,
        candidates: candidate_count,
        alive: outcome.alive.len(),
        new_items: outcome.new_items,
    };
    store
        .append_run_summary(&summary)
        .context("appending run summary")?;

    tracing::info!(
        target: "run",
        mode = mode.as_str(),
        fetched = summary.sources_fetched,
        skipped = summary.sources_skipped,
        failed = summary.sources_failed,
        alive = summary.alive,
        new = summary.new_items,
        expired = outcome.expired.len(),
        "run complete"
    );
    Ok(summary)
}

/// Run forever on a fixed interval. The first tick fires immediately.
pub async fn run_loop(
    settings: &Settings,
    mode: RunMode,
    adapter: &dyn FetchAdapter,
    interval_secs: u64,
) -> Result<()> {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;
        // config/storage errors are fatal; per-source failures are not
        run_once(settings, mode, adapter).await?;
    }
}
