// src/expiry.rs
// TTL classification: persistent-domain exemption plus two TTL tiers.

use chrono::{DateTime, Duration, Utc};

use crate::model::Item;
use crate::rules::RuleSet;

/// Keywords marking time-critical notices (advisories, closures,
/// suspensions, delays). Items matching any of them age out on the
/// short tier.
pub const URGENT_KEYWORDS: &[&str] = &[
    "预警", "停诊", "延误", "封闭", "中断", "限流", "通告", "调整", "变更",
    "advisory", "closure", "suspension", "delay", "outage", "disruption",
];

/// TTL tiers. Defaults: 72 h for urgent notices, 30 days otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryPolicy {
    pub urgent_ttl: Duration,
    pub default_ttl: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            urgent_ttl: Duration::hours(72),
            default_ttl: Duration::days(30),
        }
    }
}

impl ExpiryPolicy {
    /// Whether the item has aged out as of `now`.
    ///
    /// Persistent domains never expire. Otherwise the item's combined
    /// title+summary text picks the TTL tier and expiry is the strict
    /// comparison `now - published > ttl` (an item exactly `ttl` old is
    /// still alive).
    pub fn is_expired(&self, item: &Item, rules: &RuleSet, now: DateTime<Utc>) -> bool {
        if rules.is_persistent_domain(&item.source_domain) {
            return false;
        }
        let ttl = if is_urgent(&item.matchable_text()) {
            self.urgent_ttl
        } else {
            self.default_ttl
        };
        now - item.published > ttl
    }
}

fn is_urgent(text: &str) -> bool {
    URGENT_KEYWORDS.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item_id;
    use chrono::TimeZone;

    fn item(title: &str, domain: &str, published: DateTime<Utc>) -> Item {
        Item {
            id: item_id(title, "https://l.test", domain),
            title: title.into(),
            link: "https://l.test".into(),
            summary: String::new(),
            published,
            source: format!("https://{domain}/feed"),
            source_domain: domain.into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn persistent_domain_never_expires() {
        let mut rules = RuleSet::default();
        rules.persistent_domains.insert("gov.test".into());
        let it = item("anything", "gov.test", now() - Duration::days(400));
        assert!(!ExpiryPolicy::default().is_expired(&it, &rules, now()));
    }

    #[test]
    fn urgent_keyword_gets_short_ttl() {
        let rules = RuleSet::default();
        let policy = ExpiryPolicy::default();
        let it = item("Bridge closure notice", "a.test", now() - Duration::hours(80));
        assert!(policy.is_expired(&it, &rules, now()));
        let fresh = item("Bridge closure notice", "a.test", now() - Duration::hours(71));
        assert!(!policy.is_expired(&fresh, &rules, now()));
    }

    #[test]
    fn default_ttl_is_30_days() {
        let rules = RuleSet::default();
        let policy = ExpiryPolicy::default();
        let it = item("Quarterly report", "a.test", now() - Duration::days(29));
        assert!(!policy.is_expired(&it, &rules, now()));
        let old = item("Quarterly report", "a.test", now() - Duration::days(31));
        assert!(policy.is_expired(&old, &rules, now()));
    }

    #[test]
    fn ttl_boundary_is_strict() {
        let rules = RuleSet::default();
        let policy = ExpiryPolicy::default();
        // exactly ttl old: alive
        let at = item("Quarterly report", "a.test", now() - policy.default_ttl);
        assert!(!policy.is_expired(&at, &rules, now()));
        // one second past: expired
        let past = item(
            "Quarterly report",
            "a.test",
            now() - policy.default_ttl - Duration::seconds(1),
        );
        assert!(policy.is_expired(&past, &rules, now()));
    }
}
