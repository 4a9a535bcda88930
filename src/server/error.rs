//! Errors surfaced by the upload endpoint.

use crate::server::models::ErrorResponse;
use crate::server::services::gateway::GatewayError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Step of the generation pipeline an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcription,
    ImageGeneration,
    ImageDownload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Transcription => "transcription",
            Stage::ImageGeneration => "image generation",
            Stage::ImageDownload => "image download",
        };
        f.write_str(name)
    }
}

/// Problems with the upload itself; the caller has to retry with valid input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("no audio file received")]
    MissingFile,

    #[error("audio file is empty")]
    EmptyFile,

    #[error("audio file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("malformed upload: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("{stage} failed: {message}")]
    Upstream { stage: Stage, message: String },

    #[error("{stage} failed: the AI service could not be reached ({message}), check the network connection")]
    Network { stage: Stage, message: String },

    #[error("{stage} failed: the AI service did not answer in time")]
    Timeout { stage: Stage },
}

impl GenerationError {
    pub fn at(stage: Stage, err: GatewayError) -> Self {
        match err {
            GatewayError::Upstream(message) => GenerationError::Upstream { stage, message },
            GatewayError::Network(message) => GenerationError::Network { stage, message },
            GatewayError::Timeout => GenerationError::Timeout { stage },
        }
    }

    pub fn upstream(stage: Stage, message: impl Into<String>) -> Self {
        GenerationError::Upstream {
            stage,
            message: message.into(),
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            GenerationError::Input(_) => None,
            GenerationError::Upstream { stage, .. }
            | GenerationError::Network { stage, .. }
            | GenerationError::Timeout { stage } => Some(*stage),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::Input(InputError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            GenerationError::Input(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Generation failed: {}", self);
        } else {
            warn!("Rejected upload: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
