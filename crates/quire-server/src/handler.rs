use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use quire_append::{normalize_image_path, AppendRequest};
use quire_types::{DocumentId, DocumentRole, JobId, PageKey};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::error::ApiError;
use crate::state::AppState;

/// JSON body of an append call.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendBody {
    pub job_id: String,
    pub key: String,
    pub image_path: String,
    #[serde(default)]
    pub hero_name: Option<String>,
    #[serde(default)]
    pub comic_title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResponse {
    pub success: bool,
    pub pdf_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub success: bool,
    pub pdf_url: String,
    pub version_key: String,
    pub pages: Vec<String>,
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "quire-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Bare `OPTIONS` on an append endpoint. Real preflights are answered by
/// the CORS layer before reaching this.
pub async fn options_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn append_customer_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AppendResponse>, ApiError> {
    append_page(state, DocumentRole::Customer, &body).await
}

pub async fn append_lulu_interior_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AppendResponse>, ApiError> {
    append_page(state, DocumentRole::LuluInterior, &body).await
}

async fn append_page(
    state: AppState,
    role: DocumentRole,
    body: &[u8],
) -> Result<Json<AppendResponse>, ApiError> {
    let request = parse_append(&state, role, body)?;
    let appender = state.appender.clone();
    // Detached so a client hanging up cannot cut an append off mid-publish.
    let outcome = tokio::spawn(async move { appender.append(&request).await })
        .await
        .map_err(|e| {
            error!(error = %e, "append task failed");
            ApiError::internal("append task failed")
        })??;
    Ok(Json(AppendResponse {
        success: true,
        pdf_url: outcome.url,
    }))
}

fn parse_append(state: &AppState, role: DocumentRole, body: &[u8]) -> Result<AppendRequest, ApiError> {
    let body: AppendBody = serde_json::from_slice(body)
        .map_err(|e| ApiError::unprocessable(format!("invalid request body: {e}")))?;
    let job_id = JobId::new(body.job_id).map_err(|e| ApiError::unprocessable(e.to_string()))?;
    let page = PageKey::new(body.key).map_err(|e| ApiError::unprocessable(e.to_string()))?;
    let image_path = normalize_image_path(&body.image_path, &state.image_prefixes)?;

    let mut request = AppendRequest::new(DocumentId::new(role, job_id), page, image_path);
    request.meta.title = body.comic_title.filter(|t| !t.trim().is_empty());
    request.meta.author = body.hero_name.filter(|h| !h.trim().is_empty());
    Ok(request)
}

/// Latest version of one document.
pub async fn document_handler(
    State(state): State<AppState>,
    Path((role, job_id)): Path<(String, String)>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let role: DocumentRole = role.parse().map_err(|e: quire_types::TypeError| {
        ApiError::not_found(e.to_string())
    })?;
    let job_id = JobId::new(job_id).map_err(|e| ApiError::unprocessable(e.to_string()))?;
    let doc = DocumentId::new(role, job_id);
    let current = state
        .appender
        .current(&doc)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no version of {doc} exists")))?;
    Ok(Json(DocumentResponse {
        success: true,
        pdf_url: current.url,
        version_key: current.version_key.as_str().to_string(),
        pages: current.pages,
    }))
}
