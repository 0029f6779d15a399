//! HTTP interface for document search.
//!
//! Form-encoded endpoints for searching documents under the document root,
//! directories under the scan directory, and uploaded PDFs.

mod error;
mod handlers;
mod routes;

pub use error::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::service::SearchService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
    pub allowed_origins: Arc<Vec<String>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self::with_service(SearchService::from_settings(settings), settings)
    }

    pub fn with_service(service: SearchService, settings: &Settings) -> Self {
        Self {
            service: Arc::new(service),
            allowed_origins: Arc::new(settings.allowed_origins.clone()),
            max_upload_bytes: settings.max_upload_bytes,
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!(
        "Starting server at http://{} (root: {})",
        addr,
        settings.document_root.display()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
