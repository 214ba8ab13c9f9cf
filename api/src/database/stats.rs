use super::types::Database;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetStatistics {
    pub total: i64,
    pub enabled: i64,
    pub disabled: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_type: BTreeMap<String, i64>,
    pub by_region: BTreeMap<String, i64>,
}

// Only ever called with the fixed column names below
async fn count_grouped_by(db: &Database, column: &str) -> Result<BTreeMap<String, i64>> {
    let rows: Vec<(Option<String>, i64)> = sqlx::query_as(&format!(
        "SELECT {column}, COUNT(id) FROM targets GROUP BY {column}"
    ))
    .fetch_all(&db.pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(key, count)| key.map(|k| (k, count)))
        .collect())
}

impl Database {
    /// Target counts overall, by enabled flag, and grouped by status, type and region.
    /// Targets with no value for a grouping column are left out of that group.
    pub async fn get_statistics(&self) -> Result<TargetStatistics> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM targets")
            .fetch_one(&self.pool)
            .await?;
        let enabled: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM targets WHERE enabled = 1")
            .fetch_one(&self.pool)
            .await?;
        let disabled: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM targets WHERE enabled = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(TargetStatistics {
            total,
            enabled,
            disabled,
            by_status: count_grouped_by(self, "last_status").await?,
            by_type: count_grouped_by(self, "probe_type").await?,
            by_region: count_grouped_by(self, "region").await?,
        })
    }
}

#[cfg(test)]
mod tests;
