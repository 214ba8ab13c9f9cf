/// Shared test helpers for database tests
use super::{Database, NewTarget};
use sqlx::sqlite::SqlitePoolOptions;

/// Set up an in-memory test database with migrations applied and default probes seeded.
/// A single connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite database");

    Database::from_pool(pool)
        .await
        .expect("Failed to initialize test database")
}

/// A valid creation request with every required field set
pub fn new_target(hostname: &str) -> NewTarget {
    NewTarget {
        hostname: Some(hostname.to_string()),
        address: Some(format!("{}.internal", hostname)),
        region: Some("US-East".to_string()),
        zone: Some("zone-a".to_string()),
        probe_type: Some("HTTP".to_string()),
        assignees: Some("team-web".to_string()),
        ..Default::default()
    }
}

pub async fn insert_target(db: &Database, target: NewTarget) -> i64 {
    db.create_target(&target)
        .await
        .expect("Failed to create test target")
}
