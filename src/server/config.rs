use super::handlers::{audio_to_image, health};
use super::services::{build_gateway, GatewayError, GenerationPipeline};
use crate::configuration::Settings;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: GenerationPipeline,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: GenerationPipeline, max_upload_bytes: usize) -> Self {
        Self {
            pipeline,
            max_upload_bytes,
        }
    }
}

pub fn configure_app(settings: &Settings) -> Result<Router, GatewayError> {
    let gateway = build_gateway(settings)?;
    let pipeline = GenerationPipeline::new(gateway, settings.application.request_timeout())?;
    let metadata = pipeline.metadata();
    info!(
        "Gateway {} (live: {}, models: {} / {})",
        metadata.name, metadata.live, metadata.transcription_model, metadata.image_model
    );
    let state = AppState::new(pipeline, settings.application.max_upload_bytes);

    Ok(app_router(state, &settings.application.frontend_url))
}

pub fn app_router(state: AppState, frontend_url: &str) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(health))
        .route("/api/audio-to-image", post(audio_to_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(frontend_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match frontend_url.trim_end_matches('/').parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(_) => {
            warn!(
                "Invalid frontend origin {:?}, falling back to {}",
                frontend_url,
                crate::configuration::DEFAULT_FRONTEND_URL
            );
            HeaderValue::from_static(crate::configuration::DEFAULT_FRONTEND_URL)
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
