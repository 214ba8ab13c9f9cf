use super::core::now_ns;
use super::probes::Probe;
use super::types::Database;
use crate::search::{self, SqlValue};
use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{Sqlite, Transaction};
use std::collections::HashMap;

const TARGET_COLUMNS: &str = "id, hostname, address, region, zone, probe_type, assignees, enabled, port, protocol, path, expect_status_code, timeout, last_status, last_status_code, last_check_ns, last_updated_ns";

const DEFAULT_TIMEOUT_SECS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Target {
    pub id: i64,
    pub hostname: String,
    pub address: String,
    pub region: String,
    pub zone: String,
    /// HTTP, ICMP, TCP, ...
    pub probe_type: String,
    /// Comma-separated
    pub assignees: String,
    pub enabled: bool,
    pub port: Option<i64>,
    pub protocol: Option<String>,
    pub path: Option<String>,
    pub expect_status_code: Option<String>,
    /// Seconds
    pub timeout: i64,
    /// UP, DOWN, UNKNOWN
    pub last_status: Option<String>,
    pub last_status_code: Option<String>,
    pub last_check_ns: Option<i64>,
    pub last_updated_ns: i64,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probes: Option<Vec<Probe>>,
}

/// Request body for target creation. Required fields are optional here so that
/// a missing one can be reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTarget {
    pub hostname: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub probe_type: Option<String>,
    pub assignees: Option<String>,
    pub enabled: Option<bool>,
    pub port: Option<i64>,
    pub protocol: Option<String>,
    pub path: Option<String>,
    pub expect_status_code: Option<String>,
    pub timeout: Option<i64>,
    pub probe_ids: Option<Vec<i64>>,
}

impl NewTarget {
    /// First required field that is absent
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("hostname", &self.hostname),
            ("address", &self.address),
            ("region", &self.region),
            ("zone", &self.zone),
            ("probe_type", &self.probe_type),
            ("assignees", &self.assignees),
        ]
        .into_iter()
        .find(|(_, value)| value.is_none())
        .map(|(name, _)| name)
    }
}

/// A present JSON `null` becomes `Some(None)`; an absent field stays `None`.
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A column assignment; `None` writes NULL.
type ColumnUpdate = (&'static str, Option<SqlValue>);

/// Partial update; absent fields are left untouched. The nullable columns
/// accept an explicit `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetUpdate {
    pub hostname: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub probe_type: Option<String>,
    pub assignees: Option<String>,
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub port: Option<Option<i64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub protocol: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub path: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub expect_status_code: Option<Option<String>>,
    pub timeout: Option<i64>,
    /// Replaces the probe associations when present
    pub probe_ids: Option<Vec<i64>>,
}

impl TargetUpdate {
    fn column_updates(&self) -> Vec<ColumnUpdate> {
        let required_text = [
            ("hostname", &self.hostname),
            ("address", &self.address),
            ("region", &self.region),
            ("zone", &self.zone),
            ("probe_type", &self.probe_type),
            ("assignees", &self.assignees),
        ];
        let nullable_text = [
            ("protocol", &self.protocol),
            ("path", &self.path),
            ("expect_status_code", &self.expect_status_code),
        ];

        let mut updates: Vec<ColumnUpdate> = required_text
            .into_iter()
            .filter_map(|(column, value)| {
                value
                    .as_ref()
                    .map(|v| (column, Some(SqlValue::String(v.clone()))))
            })
            .collect();
        updates.extend(nullable_text.into_iter().filter_map(|(column, value)| {
            value
                .as_ref()
                .map(|v| (column, v.clone().map(SqlValue::String)))
        }));
        if let Some(port) = self.port {
            updates.push(("port", port.map(SqlValue::Integer)));
        }
        if let Some(timeout) = self.timeout {
            updates.push(("timeout", Some(SqlValue::Integer(timeout))));
        }
        if let Some(enabled) = self.enabled {
            updates.push(("enabled", Some(SqlValue::Bool(enabled))));
        }
        updates
    }
}

/// Fields accepted by a batch `update`: everything a single update takes
/// (except probe links) plus the last check result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchFields {
    #[serde(flatten)]
    pub target: TargetUpdate,
    #[serde(default, deserialize_with = "explicit_null")]
    pub last_status: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub last_status_code: Option<Option<String>>,
}

impl BatchFields {
    fn column_updates(&self) -> Vec<ColumnUpdate> {
        let mut updates = self.target.column_updates();
        for (column, value) in [
            ("last_status", &self.last_status),
            ("last_status_code", &self.last_status_code),
        ] {
            if let Some(value) = value {
                updates.push((column, value.clone().map(SqlValue::String)));
            }
        }
        updates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    Delete,
    Enable,
    Disable,
    Update,
}

impl BatchOperation {
    pub fn parse(operation: &str) -> Option<Self> {
        match operation {
            "delete" => Some(Self::Delete),
            "enable" => Some(Self::Enable),
            "disable" => Some(Self::Disable),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Number of targets affected
    Applied(usize),
    /// None of the requested ids exist
    NoTargets,
    /// Unknown operation, or `update` without any column to change
    Unsupported,
}

#[derive(sqlx::FromRow)]
struct TargetProbeRow {
    target_id: i64,
    #[sqlx(flatten)]
    probe: Probe,
}

impl Database {
    pub async fn list_targets(&self, include_probes: bool) -> Result<Vec<Target>> {
        self.search_targets("", include_probes).await
    }

    /// Runs a search query (`field=value` terms or free text) against targets.
    /// An empty query returns every target.
    pub async fn search_targets(&self, query: &str, include_probes: bool) -> Result<Vec<Target>> {
        let plan = search::plan(query);
        let (clause, values) = search::build_sql(&plan);
        tracing::debug!(?plan, clause = %clause, "Searching targets");

        let mut sql = format!("SELECT {} FROM targets", TARGET_COLUMNS);
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        sql.push_str(" ORDER BY id");

        let mut query_builder = sqlx::query_as::<_, Target>(&sql);
        for value in values {
            query_builder = match value {
                SqlValue::String(s) => query_builder.bind(s),
                SqlValue::Integer(i) => query_builder.bind(i),
                SqlValue::Bool(b) => query_builder.bind(b),
            };
        }
        let mut targets = query_builder.fetch_all(&self.pool).await?;

        if include_probes {
            self.attach_probes(&mut targets).await?;
        }
        Ok(targets)
    }

    pub async fn list_enabled_targets(&self) -> Result<Vec<Target>> {
        let targets = sqlx::query_as::<_, Target>(&format!(
            "SELECT {} FROM targets WHERE enabled = 1 ORDER BY id",
            TARGET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(targets)
    }

    pub async fn get_target(&self, target_id: i64, include_probes: bool) -> Result<Option<Target>> {
        let target = sqlx::query_as::<_, Target>(&format!(
            "SELECT {} FROM targets WHERE id = ?",
            TARGET_COLUMNS
        ))
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut target) = target else {
            return Ok(None);
        };
        if include_probes {
            target.probes = Some(self.probes_for_target(target_id).await?);
        }
        Ok(Some(target))
    }

    /// Creates a target and returns its id. Unknown probe ids are ignored.
    pub async fn create_target(&self, target: &NewTarget) -> Result<i64> {
        if let Some(field) = target.missing_field() {
            bail!("Missing required field: {}", field);
        }
        let probe_ids = match &target.probe_ids {
            Some(ids) => self.existing_probe_ids(ids).await?,
            None => Vec::new(),
        };

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO targets (hostname, address, region, zone, probe_type, assignees, enabled, port, protocol, path, expect_status_code, timeout, last_updated_ns) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(target.hostname.as_deref())
        .bind(target.address.as_deref())
        .bind(target.region.as_deref())
        .bind(target.zone.as_deref())
        .bind(target.probe_type.as_deref())
        .bind(target.assignees.as_deref())
        .bind(target.enabled.unwrap_or(true))
        .bind(target.port)
        .bind(target.protocol.as_deref())
        .bind(target.path.as_deref())
        .bind(target.expect_status_code.as_deref())
        .bind(target.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
        .bind(now_ns())
        .execute(&mut *tx)
        .await?;
        let target_id = result.last_insert_rowid();

        replace_probe_links(&mut tx, target_id, &probe_ids).await?;
        tx.commit().await?;

        tracing::info!(target_id, probes = probe_ids.len(), "Created target");
        Ok(target_id)
    }

    /// Applies a partial update. Returns false when the target doesn't exist.
    pub async fn update_target(&self, target_id: i64, update: &TargetUpdate) -> Result<bool> {
        if !self.target_exists(target_id).await? {
            return Ok(false);
        }
        let probe_ids = match &update.probe_ids {
            Some(ids) => Some(self.existing_probe_ids(ids).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        apply_column_updates(&mut tx, target_id, &update.column_updates()).await?;
        if let Some(probe_ids) = &probe_ids {
            replace_probe_links(&mut tx, target_id, probe_ids).await?;
        }
        tx.commit().await?;

        tracing::info!(target_id, "Updated target");
        Ok(true)
    }

    /// Returns false when the target doesn't exist
    pub async fn delete_target(&self, target_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        delete_probe_links(&mut tx, target_id).await?;
        let deleted = sqlx::query("DELETE FROM targets WHERE id = ?")
            .bind(target_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        if deleted > 0 {
            tracing::info!(target_id, "Deleted target");
        }
        Ok(deleted > 0)
    }

    /// Applies one operation to every existing target among `target_ids`, in a
    /// single transaction.
    pub async fn batch_operation(
        &self,
        operation: &str,
        target_ids: &[i64],
        fields: Option<&BatchFields>,
    ) -> Result<BatchOutcome> {
        let mut existing = Vec::with_capacity(target_ids.len());
        for &target_id in target_ids {
            if !existing.contains(&target_id) && self.target_exists(target_id).await? {
                existing.push(target_id);
            }
        }
        if existing.is_empty() {
            return Ok(BatchOutcome::NoTargets);
        }

        let Some(operation_kind) = BatchOperation::parse(operation) else {
            return Ok(BatchOutcome::Unsupported);
        };
        let updates = fields.map(BatchFields::column_updates).unwrap_or_default();
        if operation_kind == BatchOperation::Update && updates.is_empty() {
            return Ok(BatchOutcome::Unsupported);
        }

        let mut tx = self.pool.begin().await?;
        for &target_id in &existing {
            match operation_kind {
                BatchOperation::Delete => {
                    delete_probe_links(&mut tx, target_id).await?;
                    sqlx::query("DELETE FROM targets WHERE id = ?")
                        .bind(target_id)
                        .execute(&mut *tx)
                        .await?;
                }
                BatchOperation::Enable | BatchOperation::Disable => {
                    sqlx::query("UPDATE targets SET enabled = ?, last_updated_ns = ? WHERE id = ?")
                        .bind(operation_kind == BatchOperation::Enable)
                        .bind(now_ns())
                        .bind(target_id)
                        .execute(&mut *tx)
                        .await?;
                }
                BatchOperation::Update => {
                    apply_column_updates(&mut tx, target_id, &updates).await?;
                }
            }
        }
        tx.commit().await?;

        tracing::info!(operation, affected = existing.len(), "Batch operation applied");
        Ok(BatchOutcome::Applied(existing.len()))
    }

    async fn target_exists(&self, target_id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM targets WHERE id = ?")
            .bind(target_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn probes_for_target(&self, target_id: i64) -> Result<Vec<Probe>> {
        let probes = sqlx::query_as::<_, Probe>(
            "SELECT p.id AS id, p.name AS name, p.location AS location, p.provider AS provider, p.ip_address AS ip_address, p.enabled AS enabled, p.last_updated_ns AS last_updated_ns
             FROM probes p JOIN target_probes tp ON tp.probe_id = p.id
             WHERE tp.target_id = ? ORDER BY p.id",
        )
        .bind(target_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(probes)
    }

    async fn attach_probes(&self, targets: &mut [Target]) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        let rows = sqlx::query_as::<_, TargetProbeRow>(
            "SELECT tp.target_id AS target_id, p.id AS id, p.name AS name, p.location AS location, p.provider AS provider, p.ip_address AS ip_address, p.enabled AS enabled, p.last_updated_ns AS last_updated_ns
             FROM target_probes tp JOIN probes p ON p.id = tp.probe_id
             ORDER BY tp.target_id, p.id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_target: HashMap<i64, Vec<Probe>> = HashMap::new();
        for row in rows {
            by_target.entry(row.target_id).or_default().push(row.probe);
        }
        for target in targets.iter_mut() {
            target.probes = Some(by_target.remove(&target.id).unwrap_or_default());
        }
        Ok(())
    }
}

async fn apply_column_updates(
    tx: &mut Transaction<'_, Sqlite>,
    target_id: i64,
    updates: &[ColumnUpdate],
) -> Result<()> {
    let assignments: Vec<String> = updates
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .chain(std::iter::once("last_updated_ns = ?".to_string()))
        .collect();
    let sql = format!("UPDATE targets SET {} WHERE id = ?", assignments.join(", "));

    let mut query = sqlx::query(&sql);
    for (_, value) in updates {
        query = match value {
            Some(SqlValue::String(s)) => query.bind(s.clone()),
            Some(SqlValue::Integer(i)) => query.bind(*i),
            Some(SqlValue::Bool(b)) => query.bind(*b),
            None => query.bind(None::<String>),
        };
    }
    query
        .bind(now_ns())
        .bind(target_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn replace_probe_links(
    tx: &mut Transaction<'_, Sqlite>,
    target_id: i64,
    probe_ids: &[i64],
) -> Result<()> {
    delete_probe_links(tx, target_id).await?;
    for &probe_id in probe_ids {
        sqlx::query("INSERT INTO target_probes (target_id, probe_id) VALUES (?, ?)")
            .bind(target_id)
            .bind(probe_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn delete_probe_links(tx: &mut Transaction<'_, Sqlite>, target_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM target_probes WHERE target_id = ?")
        .bind(target_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
