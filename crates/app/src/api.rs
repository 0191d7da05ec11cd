use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use report_rag_core::{
    extract_documents, ingest_documents, is_pdf_filename, Answer, IngestError, LoaderKind,
    QueryError, QueryService, ResetOutcome, TextUnit, UploadStore, VectorIndex,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Handles built once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<dyn VectorIndex>,
    pub query: Arc<QueryService>,
    pub uploads: UploadStore,
    pub loader: LoaderKind,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            "/ingest",
            post(ingest).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/query", post(query))
        .route("/reset", delete(reset))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    /// An extractor refused the request; keeps the status axum chose for it.
    Rejected { status: StatusCode, detail: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
            ApiError::Rejected { status, detail } => {
                if status.is_server_error() {
                    tracing::error!(%status, %detail, "request rejected");
                } else {
                    tracing::debug!(%status, %detail, "request rejected");
                }
                (status, detail)
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        match error {
            IngestError::MissingFileName(_) => ApiError::BadRequest(error.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        ApiError::Rejected {
            status: error.status(),
            detail: format!("invalid multipart body: {}", error.body_text()),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::EmptyQuestion => ApiError::BadRequest(error.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub filename: String,
    pub total_pages: usize,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

async fn ingest(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !is_pdf_filename(&filename) {
            return Err(ApiError::BadRequest("Only PDF files are accepted.".to_string()));
        }

        let bytes = field.bytes().await?;
        upload = Some((filename, bytes));
        break;
    }

    let Some((filename, bytes)) = upload else {
        return Err(ApiError::BadRequest("multipart field `file` is required".to_string()));
    };

    let path = state
        .uploads
        .save(&filename, &bytes)
        .await
        .map_err(|error| match error {
            IngestError::Io(error) => ApiError::Internal(format!("failed to save upload: {error}")),
            other => ApiError::from(other),
        })?;
    tracing::info!(%filename, path = %path.display(), bytes = bytes.len(), "saved upload");

    let documents = extract_on_blocking_pool(state.loader, path).await?;
    let total_pages = documents.len();
    ingest_documents(state.index.as_ref(), documents).await?;

    Ok(Json(IngestResponse {
        filename,
        total_pages,
        status: "Ingestion successful".to_string(),
    }))
}

async fn extract_on_blocking_pool(
    loader: LoaderKind,
    path: PathBuf,
) -> Result<Vec<TextUnit>, ApiError> {
    let extracted = tokio::task::spawn_blocking(move || {
        let loader = loader.loader_for(&path);
        extract_documents(loader.as_ref())
    })
    .await
    .map_err(|error| ApiError::Internal(format!("extraction task failed: {error}")))?;

    Ok(extracted?)
}

async fn query(
    State(state): State<AppState>,
    request: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Answer>, ApiError> {
    let Json(request) = request?;
    let answer = state.query.answer(&request.question).await?;
    Ok(Json(answer))
}

async fn reset(State(state): State<AppState>) -> Json<ResetResponse> {
    let response = match state.index.reset().await {
        Ok(ResetOutcome::Cleared) => ResetResponse {
            status: "Database cleared".to_string(),
            outcome: "cleared".to_string(),
            detail: None,
        },
        Ok(ResetOutcome::AlreadyEmpty) => ResetResponse {
            status: "Database was already empty".to_string(),
            outcome: "already_empty".to_string(),
            detail: None,
        },
        Err(error) => {
            tracing::warn!(%error, "reset failed");
            ResetResponse {
                status: "Database was already empty or error".to_string(),
                outcome: "error".to_string(),
                detail: Some(error.to_string()),
            }
        }
    };
    Json(response)
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let chunks = state
        .index
        .count()
        .await
        .map_err(|error| ApiError::Internal(error.to_string()))?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "chunks": chunks,
        "top_k": state.query.top_k(),
    })))
}

async fn not_found() -> ApiError {
    ApiError::Rejected {
        status: StatusCode::NOT_FOUND,
        detail: "Not Found".to_string(),
    }
}
