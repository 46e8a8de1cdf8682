//! Read-only consumers of the event log and configuration records.
//!
//! Nothing here mutates state: statistics are rebuilt from typed events and
//! queries read committed records only.

pub mod query;
pub mod stats;

pub use query::ConfigQuery;
pub use stats::{MigrationStats, UpgradeRecord};
