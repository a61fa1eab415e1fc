// src/ingest/mod.rs
pub mod fetch;
pub mod normalize;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

use crate::health::HealthTable;
use crate::ingest::types::FetchAdapter;
use crate::model::Item;
use crate::rules::RuleSet;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_entries_total", "Raw entries parsed from feeds.");
        describe_counter!(
            "ingest_kept_total",
            "Entries kept after normalization + filtering."
        );
        describe_counter!(
            "ingest_filtered_total",
            "Entries rejected by whitelist/blacklist rules."
        );
        describe_counter!("ingest_dedup_total", "Entries collapsed by identity.");
        describe_counter!("ingest_fetch_errors_total", "Source fetch/parse errors.");
        describe_counter!(
            "ingest_sources_skipped_total",
            "Sources skipped while inside a health cooldown."
        );
        describe_counter!("ingest_fetch_retries_total", "Timeout retries.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts of the last ingest run.");
    });
}

/// Fetch/skip bookkeeping for one run, feeding the run summary.
#[derive(Debug, Default)]
pub struct IngestStats {
    pub sources_total: usize,
    pub sources_fetched: usize,
    pub sources_skipped: usize,
    pub sources_failed: usize,
    pub entries_seen: usize,
    pub filtered_out: usize,
    pub dedup_out: usize,
}

/// Run the gather phase once: for each source, gate on the health
/// table, fetch, normalize, filter, and accumulate candidates with
/// first-seen-wins identity dedup.
///
/// A failing source is recorded and skipped; it never aborts the run.
/// Sources not yet attempted when `deadline` passes are skipped for
/// this run with no health penalty. The health table is mutated in
/// place and owned by the caller.
pub async fn gather_candidates(
    adapter: &dyn FetchAdapter,
    sources: &[String],
    rules: &RuleSet,
    health: &mut HealthTable,
    now: DateTime<Utc>,
    deadline: Option<DateTime<Utc>>,
) -> (Vec<Item>, IngestStats) {
    ensure_metrics_described();

    let mut stats = IngestStats {
        sources_total: sources.len(),
        ..Default::default()
    };
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut candidates: Vec<Item> = Vec::new();

    for source in sources {
        if let Some(deadline) = deadline {
            if Utc::now() >= deadline {
                tracing::warn!(target: "ingest", source = %source, "run deadline passed, deferring to next run");
                stats.sources_skipped += 1;
                continue;
            }
        }
        if let Some(until) = health.should_skip(source, now) {
            tracing::info!(target: "ingest", source = %source, until = %until, "source in cooldown, skipping");
            counter!("ingest_sources_skipped_total").increment(1);
            stats.sources_skipped += 1;
            continue;
        }

        let entries = match adapter.fetch(source).await {
            Ok(entries) => {
                health.record_success(source, now);
                stats.sources_fetched += 1;
                entries
            }
            Err(e) => {
                tracing::warn!(target: "ingest", source = %source, error = %e, "fetch failed");
                counter!("ingest_fetch_errors_total").increment(1);
                health.record_failure(source, &e.to_string(), now);
                stats.sources_failed += 1;
                continue;
            }
        };

        counter!("ingest_entries_total").increment(entries.len() as u64);
        stats.entries_seen += entries.len();

        for entry in &entries {
            let item = normalize::normalize(source, entry, now);
            if !rules.passes(&item) {
                stats.filtered_out += 1;
                continue;
            }
            if !seen_ids.insert(item.id.clone()) {
                stats.dedup_out += 1;
                continue;
            }
            candidates.push(item);
        }
    }

    counter!("ingest_kept_total").increment(candidates.len() as u64);
    counter!("ingest_filtered_total").increment(stats.filtered_out as u64);
    counter!("ingest_dedup_total").increment(stats.dedup_out as u64);
    gauge!("ingest_last_run_ts").set(now.timestamp() as f64);

    (candidates, stats)
}
