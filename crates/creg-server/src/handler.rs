use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use creg_engine::{
    BlobRef, CertificateId, CertificateRecord, ConsistencyReport, IssueRequest, Registry,
    RegistryStats, VerificationOutcome,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub max_payload_bytes: usize,
}

/// Run a registry call off the async executor. Ledger appends may fsync.
async fn blocking<T, E, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(Into::into)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<RegistryStats>, ApiError> {
    let registry = state.registry.clone();
    Ok(Json(blocking(move || registry.stats()).await?))
}

/// `POST /v1/certificates` body. `payload` is the hex-encoded document.
#[derive(Debug, Serialize, Deserialize)]
pub struct IssueBody {
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    pub course: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub issuer: String,
    pub payload: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssueResponse {
    pub id: CertificateId,
    pub blob_ref: BlobRef,
    pub issued_at: u64,
    /// Human-readable `cert_<student>_<course>_<millis>` label.
    pub label: String,
}

pub async fn issue_handler(
    State(state): State<AppState>,
    Json(body): Json<IssueBody>,
) -> Result<(StatusCode, Json<IssueResponse>), ApiError> {
    let payload = hex::decode(body.payload.trim())
        .map_err(|e| ApiError::BadRequest(format!("payload is not valid hex: {e}")))?;
    if payload.len() > state.max_payload_bytes {
        return Err(ApiError::PayloadTooLarge {
            actual: payload.len(),
            limit: state.max_payload_bytes,
        });
    }

    let request = IssueRequest::new(body.student_id, body.course)
        .with_student_name(body.student_name)
        .with_grade(body.grade)
        .with_issuer(body.issuer)
        .with_payload(payload);

    let registry = state.registry.clone();
    let receipt = blocking(move || registry.issue(request)).await?;
    let record = &receipt.record;
    let label = creg_crypto::legacy_label(&record.student_id, &record.course, record.issued_at);

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            id: receipt.id,
            blob_ref: receipt.blob_ref,
            issued_at: record.issued_at.as_millis(),
            label,
        }),
    ))
}

/// Verification answer. Always `200`; absence is `found: false`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<CertificateRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
}

pub async fn verify_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let registry = state.registry.clone();
    let outcome = blocking(move || registry.verify(&id)).await?;
    let response = match outcome {
        VerificationOutcome::Verified { record, locator } => VerifyResponse {
            found: true,
            record: Some(record),
            locator,
        },
        VerificationOutcome::NotFound => VerifyResponse {
            found: false,
            record: None,
            locator: None,
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CertificateEntry {
    pub id: CertificateId,
    pub record: CertificateRecord,
}

pub async fn list_handler(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<CertificateEntry>>, ApiError> {
    let registry = state.registry.clone();
    let records = blocking(move || registry.list_by_student(&student_id)).await?;
    Ok(Json(
        records
            .into_iter()
            .map(|record| CertificateEntry {
                id: record.id,
                record,
            })
            .collect(),
    ))
}

/// `GET /v1/certificates/:id/payload`: the raw document bytes.
pub async fn payload_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = CertificateId::parse(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let registry = state.registry.clone();
    let bytes = blocking(move || registry.fetch_payload(&id)).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

/// Index consistency of the running registry plus payloads the blob store
/// has lost.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditResponse {
    pub report: ConsistencyReport,
    pub missing_blobs: Vec<CertificateId>,
}

pub async fn audit_handler(State(state): State<AppState>) -> Result<Json<AuditResponse>, ApiError> {
    let registry = state.registry.clone();
    let response = blocking(move || {
        Ok::<_, creg_engine::EngineError>(AuditResponse {
            report: registry.audit()?,
            missing_blobs: registry.missing_blobs()?,
        })
    })
    .await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepairResponse {
    /// Index entries written by the rebuild.
    pub rebuilt: usize,
    /// Audit taken after the rebuild.
    pub report: ConsistencyReport,
}

/// `POST /v1/audit/repair`: rebuild the student index from the ledger.
pub async fn repair_handler(
    State(state): State<AppState>,
) -> Result<Json<RepairResponse>, ApiError> {
    let registry = state.registry.clone();
    let response = blocking(move || {
        let rebuilt = registry.rebuild_index()?;
        tracing::info!(rebuilt, "student index repaired on request");
        Ok::<_, creg_engine::EngineError>(RepairResponse {
            rebuilt,
            report: registry.audit()?,
        })
    })
    .await?;
    Ok(Json(response))
}
