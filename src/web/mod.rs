//! Web layer: thin axum handlers over the ingest and EPG services.

use anyhow::Result;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::epg::{ChannelProvider, EpgService, JsonFileChannelProvider};
use crate::errors::AppError;
use crate::ingestor::IngestService;

pub mod api;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config) -> Result<Self> {
        let channels: Arc<dyn ChannelProvider> = Arc::new(JsonFileChannelProvider::new(
            config.epg.channels_file.clone(),
        ));
        let state = AppState {
            ingest: Arc::new(IngestService::new(config.ingest.clone())),
            epg: Arc::new(EpgService::new(config.epg.clone())),
            channels,
            config: config.clone(),
        };

        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;

        Ok(Self {
            app: Self::create_router(state),
            addr,
        })
    }

    fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(api::health))
            .route("/api/ingest", post(api::trigger_ingest))
            .route("/api/ingest/status", get(api::ingest_status))
            .route("/api/epg", get(api::query_epg))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Start the web server
    pub async fn serve(self) -> Result<()> {
        tracing::info!("Listening on {}", self.addr);
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub ingest: Arc<IngestService>,
    pub epg: Arc<EpgService>,
    pub channels: Arc<dyn ChannelProvider>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Configuration { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::IngestInProgress => StatusCode::CONFLICT,
            AppError::Fetch { .. } | AppError::Parse { .. } | AppError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("error"),
            "details": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(AppError::configuration("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::IngestInProgress), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AppError::fetch("http://x", "timeout")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_of(AppError::parse("bad")), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(AppError::internal("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
