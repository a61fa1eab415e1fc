// src/reconcile.rs
// Merge of this run's candidates with the previous rolling index.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::expiry::ExpiryPolicy;
use crate::model::Item;
use crate::rules::RuleSet;

/// Outcome of one reconciliation, with counts for the run summary.
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// The new rolling index: unique by id, `published` descending,
    /// ties broken by `id` ascending.
    pub alive: Vec<Item>,
    /// Candidates dropped this run because their TTL ran out.
    pub expired: Vec<Item>,
    /// Ids present in the result but not in the previous index.
    pub new_items: usize,
}

/// Deduplicate candidates by id (first-seen wins).
pub fn dedup_first_seen(candidates: Vec<Item>) -> Vec<Item> {
    let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
    let mut out = Vec::with_capacity(candidates.len());
    for it in candidates {
        if seen.insert(it.id.clone()) {
            out.push(it);
        }
    }
    out
}

/// Produce the new rolling index from the previous one and this run's
/// candidates.
///
/// Previous items not re-seen this run are carried forward as long as
/// they still pass the expiry check; their `published` timestamp is not
/// refreshed. An item leaves the index only by expiring — a fetch
/// failure or a disabled source never evicts anything.
pub fn reconcile(
    previous: &[Item],
    candidates: Vec<Item>,
    rules: &RuleSet,
    policy: &ExpiryPolicy,
    now: DateTime<Utc>,
) -> ReconcileOutcome {
    let candidates = dedup_first_seen(candidates);

    let mut alive = Vec::with_capacity(candidates.len());
    let mut expired = Vec::new();
    for it in candidates {
        if policy.is_expired(&it, rules, now) {
            expired.push(it);
        } else {
            alive.push(it);
        }
    }

    let this_run: HashSet<&str> = alive.iter().map(|i| i.id.as_str()).collect();
    let mut carried = Vec::new();
    for prev in previous {
        if !this_run.contains(prev.id.as_str()) && !policy.is_expired(prev, rules, now) {
            carried.push(prev.clone());
        }
    }
    alive.extend(carried);

    let prev_ids: HashSet<&str> = previous.iter().map(|i| i.id.as_str()).collect();
    let new_items = alive
        .iter()
        .filter(|i| !prev_ids.contains(i.id.as_str()))
        .count();

    sort_index(&mut alive);

    ReconcileOutcome {
        alive,
        expired,
        new_items,
    }
}

/// `published` descending; identical timestamps fall back to `id`
/// ascending so the order is deterministic across runs.
pub fn sort_index(items: &mut [Item]) {
    items.sort_by(|a, b| {
        b.published
            .cmp(&a.published)
            .then_with(|| a.id.cmp(&b.id))
    });
}
