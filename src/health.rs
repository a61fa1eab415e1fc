// src/health.rs
// Per-source health tracking: failure streaks and temporary disablement.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Durable health record for one source. Created on first observation,
/// updated every run, never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceHealth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LastError {
    pub ts: DateTime<Utc>,
    pub message: String,
}

/// Health table keyed by source URL, plus the disablement policy.
///
/// Owned exclusively by the run; renderers read it afterwards but never
/// mutate it.
#[derive(Debug, Clone)]
pub struct HealthTable {
    records: BTreeMap<String, SourceHealth>,
    disable_threshold: u32,
    cooldown: Duration,
}

impl HealthTable {
    pub fn new(disable_threshold: u32, cooldown: Duration) -> Self {
        Self {
            records: BTreeMap::new(),
            disable_threshold,
            cooldown,
        }
    }

    /// Rebuild a table from persisted records.
    pub fn from_records(
        records: BTreeMap<String, SourceHealth>,
        disable_threshold: u32,
        cooldown: Duration,
    ) -> Self {
        Self {
            records,
            disable_threshold,
            cooldown,
        }
    }

    pub fn records(&self) -> &BTreeMap<String, SourceHealth> {
        &self.records
    }

    pub fn into_records(self) -> BTreeMap<String, SourceHealth> {
        self.records
    }

    /// True iff the source is inside its cooldown window. Returns the
    /// instant the disablement expires so callers can log it.
    pub fn should_skip(&self, source: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.records
            .get(source)
            .and_then(|r| r.disabled_until)
            .filter(|until| now < *until)
    }

    /// Success clears the failure streak and any disablement.
    pub fn record_success(&mut self, source: &str, now: DateTime<Utc>) {
        let rec = self.records.entry(source.to_string()).or_default();
        rec.last_success = Some(now);
        rec.last_error = None;
        rec.consecutive_failures = 0;
        rec.disabled_until = None;
    }

    /// Failure bumps the streak; at the threshold the source enters a
    /// cooldown window and is skipped until it passes.
    pub fn record_failure(&mut self, source: &str, message: &str, now: DateTime<Utc>) {
        let threshold = self.disable_threshold;
        let cooldown = self.cooldown;
        let rec = self.records.entry(source.to_string()).or_default();
        rec.last_error = Some(LastError {
            ts: now,
            message: message.to_string(),
        });
        rec.consecutive_failures += 1;
        if rec.consecutive_failures >= threshold {
            let until = now + cooldown;
            rec.disabled_until = Some(until);
            tracing::warn!(
                target: "health",
                source,
                failures = rec.consecutive_failures,
                until = %until,
                "source disabled after repeated failures"
            );
        }
    }
}
