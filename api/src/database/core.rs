use super::types::Database;
use anyhow::Result;
use sqlx::SqlitePool;

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        Self::from_pool(pool).await
    }

    /// Applies migrations and seeds default probes on an existing pool
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!().run(&pool).await?;
        let db = Self { pool };
        db.seed_default_probes().await?;
        Ok(db)
    }
}

pub(crate) fn now_ns() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
}

/// Returns true when the target registry schema exists at `database_url`
pub async fn check_schema_applied(database_url: &str) -> Result<bool, sqlx::Error> {
    let pool = SqlitePool::connect(database_url).await?;
    let exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'targets'",
    )
    .fetch_one(&pool)
    .await?;
    pool.close().await;
    Ok(exists > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_schema_applied_on_fresh_database() {
        // Every sqlite::memory: connection starts empty
        assert!(!check_schema_applied("sqlite::memory:").await.unwrap());
    }

    #[test]
    fn test_now_ns_is_positive() {
        assert!(now_ns() > 0);
    }
}
