//! HTTP request handlers.

use axum::extract::{Multipart, State};
use axum::{Form, Json};
use serde::Deserialize;

use super::error::ApiError;
use super::AppState;
use crate::ocr::ExtractionMode;
use crate::scan::SearchPolicy;
use crate::service::{
    DirectorySearchResponse, DocumentSearchResponse, NeedsOcrResponse, SearchError,
    UploadSearchResponse,
};

#[derive(Debug, Deserialize)]
pub struct SearchPdfForm {
    #[serde(alias = "path")]
    pub filepath: String,
    #[serde(alias = "query")]
    pub search_text: String,
    #[serde(default, alias = "mode")]
    pub ocr_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchDirectoryForm {
    #[serde(alias = "dir_path")]
    pub folder_path: String,
    #[serde(alias = "query")]
    pub search_text: String,
    #[serde(default, alias = "policy")]
    pub search_mode: Option<String>,
    #[serde(default, alias = "mode")]
    pub ocr_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NeedsOcrForm {
    #[serde(alias = "path")]
    pub filepath: String,
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}

/// Search a single document under the document root.
pub async fn search_pdf(
    State(state): State<AppState>,
    Form(form): Form<SearchPdfForm>,
) -> Result<Json<DocumentSearchResponse>, ApiError> {
    let mode = parse_mode(form.ocr_mode.as_deref())?;
    let service = state.service.clone();

    let response = run_blocking(move || {
        service.search_document(&form.filepath, &form.search_text, mode)
    })
    .await?;
    Ok(Json(response))
}

/// Search every supported file in a directory under the scan directory.
pub async fn search_pdfs_in_directory(
    State(state): State<AppState>,
    Form(form): Form<SearchDirectoryForm>,
) -> Result<Json<DirectorySearchResponse>, ApiError> {
    let mode = parse_mode(form.ocr_mode.as_deref())?;
    let policy = match form.search_mode.as_deref() {
        None | Some("") => SearchPolicy::default(),
        Some(s) => s.parse().map_err(ApiError::BadRequest)?,
    };
    let service = state.service.clone();

    let response = run_blocking(move || {
        service.search_directory(&form.folder_path, &form.search_text, policy, mode)
    })
    .await?;
    Ok(Json(response))
}

/// Search an uploaded PDF. Multipart fields: `file`, `search_text`, `ocr_mode`.
pub async fn search_uploaded_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadSearchResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut search_text = None;
    let mut ocr_mode = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("document").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                upload = Some((filename, bytes.to_vec()));
            }
            Some("search_text") | Some("query") => {
                search_text = Some(field_text(field).await?);
            }
            Some("ocr_mode") | Some("mode") => {
                ocr_mode = Some(field_text(field).await?);
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let search_text = search_text
        .ok_or_else(|| ApiError::BadRequest("Missing field: search_text".to_string()))?;
    let mode = parse_mode(ocr_mode.as_deref())?;

    tracing::info!("Received upload '{}' ({} bytes)", filename, bytes.len());

    let service = state.service.clone();
    let response = run_blocking(move || {
        service.search_upload(&bytes, &filename, &search_text, mode)
    })
    .await?;
    Ok(Json(response))
}

/// Report whether a document has no usable text layer.
pub async fn needs_ocr(
    State(state): State<AppState>,
    Form(form): Form<NeedsOcrForm>,
) -> Result<Json<NeedsOcrResponse>, ApiError> {
    let service = state.service.clone();
    let response = run_blocking(move || service.needs_ocr(&form.filepath)).await?;
    Ok(Json(response))
}

fn parse_mode(raw: Option<&str>) -> Result<ExtractionMode, ApiError> {
    match raw {
        None | Some("") => Ok(ExtractionMode::default()),
        Some(s) => s.parse().map_err(ApiError::BadRequest),
    }
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))
}

/// Run extraction work off the async runtime.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, SearchError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Search task failed: {}", e)))?
        .map_err(ApiError::from)
}
