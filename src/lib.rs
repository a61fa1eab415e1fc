// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod expiry;
pub mod health;
pub mod ingest;
pub mod model;
pub mod reconcile;
pub mod render;
pub mod rules;
pub mod run;
pub mod sources;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::Settings;
pub use crate::expiry::ExpiryPolicy;
pub use crate::health::{HealthTable, SourceHealth};
pub use crate::ingest::types::{FetchAdapter, FetchError, RawEntry};
pub use crate::model::{Item, RunSummary};
pub use crate::rules::RuleSet;
pub use crate::sources::RunMode;
