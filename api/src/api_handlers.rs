use crate::database::{
    BatchFields, BatchOutcome, Database, NewTarget, Probe, Target, TargetStatistics, TargetUpdate,
};
use crate::service_discovery::{self, TargetGroup};
use poem::{
    handler,
    http::StatusCode,
    web::{Data, Json, Path, Query},
    IntoResponse, Response,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

/// Longest search string accepted by `GET /api/targets`, in characters
pub const MAX_QUERY_LEN: usize = 1024;

// Common response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize + Send> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }

    fn with_status(self, status: StatusCode) -> Response {
        Json(self).with_status(status).into_response()
    }
}

fn ok<T: Serialize + Send>(data: T) -> Response {
    ApiResponse::success(data).with_status(StatusCode::OK)
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    ApiResponse::<()>::error(msg.into()).with_status(status)
}

fn internal_error(context: &str, err: anyhow::Error) -> Response {
    tracing::error!("{}: {:#}", context, err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TargetCreated {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub message: String,
    pub affected_count: usize,
}

// Query parameters for target listing/search
#[derive(Debug, Deserialize)]
pub struct TargetSearchQuery {
    #[serde(default)]
    pub q: String,
    pub include_probes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IncludeProbesQuery {
    pub include_probes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub operation: Option<String>,
    pub target_ids: Option<Vec<i64>>,
    pub fields: Option<BatchFields>,
}

/// `include_probes` is on only for a case-insensitive `true`
fn wants_probes(flag: Option<&str>) -> bool {
    flag.is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

#[handler]
pub async fn health() -> Json<HealthResponse> {
    let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    Json(HealthResponse {
        success: true,
        message: "Blackbox target registry is running".to_string(),
        environment,
    })
}

// ============ Target Endpoints ============

#[handler]
pub async fn list_targets(
    db: Data<&Arc<Database>>,
    Query(params): Query<TargetSearchQuery>,
) -> Response {
    if params.q.chars().count() > MAX_QUERY_LEN {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Search query too long (max {} characters)", MAX_QUERY_LEN),
        );
    }

    let include_probes = wants_probes(params.include_probes.as_deref());
    match db.search_targets(&params.q, include_probes).await {
        Ok(targets) => ok::<Vec<Target>>(targets),
        Err(e) => internal_error("Failed to search targets", e),
    }
}

#[handler]
pub async fn get_target(
    db: Data<&Arc<Database>>,
    Path(target_id): Path<i64>,
    Query(params): Query<IncludeProbesQuery>,
) -> Response {
    let include_probes = wants_probes(params.include_probes.as_deref());
    match db.get_target(target_id, include_probes).await {
        Ok(Some(target)) => ok(target),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Target not found"),
        Err(e) => internal_error("Failed to load target", e),
    }
}

#[handler]
pub async fn create_target(db: Data<&Arc<Database>>, Json(body): Json<NewTarget>) -> Response {
    if let Some(field) = body.missing_field() {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Missing required field: {}", field),
        );
    }

    match db.create_target(&body).await {
        Ok(id) => ApiResponse::success(TargetCreated {
            message: "Target created successfully".to_string(),
            id,
        })
        .with_status(StatusCode::CREATED),
        Err(e) => internal_error("Failed to create target", e),
    }
}

#[handler]
pub async fn update_target(
    db: Data<&Arc<Database>>,
    Path(target_id): Path<i64>,
    Json(body): Json<TargetUpdate>,
) -> Response {
    match db.update_target(target_id, &body).await {
        Ok(true) => ok(MessageResponse {
            message: "Target updated successfully".to_string(),
        }),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Target not found"),
        Err(e) => internal_error("Failed to update target", e),
    }
}

#[handler]
pub async fn delete_target(db: Data<&Arc<Database>>, Path(target_id): Path<i64>) -> Response {
    match db.delete_target(target_id).await {
        Ok(true) => ok(MessageResponse {
            message: "Target deleted successfully".to_string(),
        }),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Target not found"),
        Err(e) => internal_error("Failed to delete target", e),
    }
}

#[handler]
pub async fn batch_targets(db: Data<&Arc<Database>>, Json(body): Json<BatchRequest>) -> Response {
    let (Some(operation), Some(target_ids)) = (body.operation, body.target_ids) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: operation, target_ids",
        );
    };
    if target_ids.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "target_ids must be a non-empty array",
        );
    }

    match db
        .batch_operation(&operation, &target_ids, body.fields.as_ref())
        .await
    {
        Ok(BatchOutcome::Applied(affected_count)) => ok(BatchResult {
            message: format!("Batch {} successful", operation),
            affected_count,
        }),
        Ok(BatchOutcome::NoTargets) => {
            error_response(StatusCode::NOT_FOUND, "No valid targets found")
        }
        Ok(BatchOutcome::Unsupported) => {
            error_response(StatusCode::BAD_REQUEST, "Unsupported operation")
        }
        Err(e) => internal_error("Batch operation failed", e),
    }
}

// ============ Probe / Stats Endpoints ============

#[handler]
pub async fn list_probes(db: Data<&Arc<Database>>) -> Response {
    match db.list_probes().await {
        Ok(probes) => ok::<Vec<Probe>>(probes),
        Err(e) => internal_error("Failed to list probes", e),
    }
}

#[handler]
pub async fn get_statistics(db: Data<&Arc<Database>>) -> Response {
    match db.get_statistics().await {
        Ok(stats) => ok::<TargetStatistics>(stats),
        Err(e) => internal_error("Failed to compute statistics", e),
    }
}

// ============ Service Discovery Endpoints ============
// Prometheus reads these bodies directly, so they are not wrapped in ApiResponse.

#[handler]
pub async fn sd_test() -> Json<Vec<TargetGroup>> {
    Json(service_discovery::sample_targets())
}

#[handler]
pub async fn sd_targets(db: Data<&Arc<Database>>, Path(protocol): Path<String>) -> Response {
    match db.list_enabled_targets().await {
        Ok(targets) => {
            let groups = service_discovery::export_targets(&targets, &protocol);
            tracing::info!(
                protocol = %protocol,
                enabled = targets.len(),
                exported = groups.len(),
                "Service discovery request"
            );
            Json(groups).into_response()
        }
        Err(e) => internal_error("Failed to export service discovery targets", e),
    }
}
