pub mod types;

use bytes::Bytes;
use thiserror::Error;

pub use self::types::{GatewayMetadata, GeneratedImage, DEFAULT_IMAGE_MIME};

/// Failure of a single call to an AI capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The service answered, but with an error or an unusable body.
    #[error("{0}")]
    Upstream(String),

    /// No response was received.
    #[error("{0}")]
    Network(String),

    /// The request ran past the configured timeout.
    #[error("request timed out")]
    Timeout,
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_connect() || err.is_request() {
            GatewayError::Network(err.to_string())
        } else if err.is_decode() {
            GatewayError::Upstream(format!("invalid response from service: {err}"))
        } else {
            GatewayError::Upstream(err.to_string())
        }
    }
}

/// The two AI capabilities the generation pipeline needs.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    fn metadata(&self) -> GatewayMetadata;

    /// Speech-to-text. `format` is the audio container hint, e.g. `wav` or `webm`.
    async fn transcribe(&self, audio: Bytes, format: &str) -> Result<String, GatewayError>;

    /// Text-to-image.
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, GatewayError>;
}
