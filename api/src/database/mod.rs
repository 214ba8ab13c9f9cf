/// Default database URL for local development
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./blackbox_monitoring.db?mode=rwc";

pub mod core;
pub mod probes;
pub mod stats;
pub mod targets;
pub mod types;

// Re-export main types
pub use self::core::check_schema_applied;
pub use probes::Probe;
pub use stats::TargetStatistics;
pub use targets::{BatchFields, BatchOutcome, NewTarget, Target, TargetUpdate};
pub use types::Database;

#[cfg(test)]
pub mod test_helpers;
