use super::core::now_ns;
use super::types::Database;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Probe {
    pub id: i64,
    pub name: String,
    /// e.g. "Singapore", "USA", "KOREA"
    pub location: String,
    /// e.g. "Viettel", "FCI", "CMC"
    pub provider: String,
    pub ip_address: String,
    pub enabled: bool,
    pub last_updated_ns: i64,
}

/// (name, location, provider, ip_address)
const DEFAULT_PROBES: &[(&str, &str, &str, &str)] = &[
    ("Singapore Probe", "Singapore", "Viettel", "192.168.1.100"),
    ("USA Probe", "USA", "FCI", "192.168.1.101"),
    ("Korea Probe", "KOREA", "CMC", "192.168.1.102"),
];

impl Database {
    pub async fn list_probes(&self) -> Result<Vec<Probe>> {
        let probes = sqlx::query_as::<_, Probe>(
            "SELECT id, name, location, provider, ip_address, enabled, last_updated_ns FROM probes ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(probes)
    }

    /// Inserts the default probe set when the probe table is empty.
    /// Returns the number of probes inserted.
    pub async fn seed_default_probes(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM probes")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(0);
        }

        let now = now_ns();
        let mut tx = self.pool.begin().await?;
        for (name, location, provider, ip_address) in DEFAULT_PROBES {
            sqlx::query(
                "INSERT INTO probes (name, location, provider, ip_address, enabled, last_updated_ns) VALUES (?, ?, ?, ?, 1, ?)",
            )
            .bind(*name)
            .bind(*location)
            .bind(*provider)
            .bind(*ip_address)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!("Seeded {} default probes", DEFAULT_PROBES.len());
        Ok(DEFAULT_PROBES.len())
    }

    /// Keeps only the ids that reference an existing probe
    pub(crate) async fn existing_probe_ids(&self, probe_ids: &[i64]) -> Result<Vec<i64>> {
        let mut existing = Vec::with_capacity(probe_ids.len());
        for &probe_id in probe_ids {
            let found: Option<i64> = sqlx::query_scalar("SELECT id FROM probes WHERE id = ?")
                .bind(probe_id)
                .fetch_optional(&self.pool)
                .await?;
            match found {
                Some(id) if !existing.contains(&id) => existing.push(id),
                Some(_) => {}
                None => tracing::debug!(probe_id, "Ignoring unknown probe id"),
            }
        }
        Ok(existing)
    }
}
