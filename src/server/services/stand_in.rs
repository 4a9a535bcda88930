//! Offline substitute for the AI service, used when no credential is configured.

use crate::configuration::StandInSettings;
use crate::server::services::gateway::{Gateway, GatewayError, GatewayMetadata, GeneratedImage};
use base64::Engine;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;

pub const STAND_IN_TRANSCRIPT: &str = "This is a sample transcript used to generate an image";

const PLACEHOLDER_SVG: &str = concat!(
    r##"<svg width="1024" height="1024" xmlns="http://www.w3.org/2000/svg">"##,
    r##"<rect width="1024" height="1024" fill="#f0f0f0"/>"##,
    r##"<text x="512" y="512" font-size="24" fill="#999999" text-anchor="middle" dy=".3em">"##,
    "Placeholder image",
    "</text></svg>"
);

#[derive(Debug, Clone, Default)]
pub struct StandInGateway {
    transcribe_delay: Duration,
    image_delay: Duration,
}

impl StandInGateway {
    pub fn new(settings: &StandInSettings) -> Self {
        Self {
            transcribe_delay: Duration::from_millis(settings.transcribe_delay_ms),
            image_delay: Duration::from_millis(settings.image_delay_ms),
        }
    }

    /// A stand-in that answers immediately.
    pub fn instant() -> Self {
        Self::default()
    }

    /// Base64 of the placeholder SVG.
    pub fn placeholder_base64() -> String {
        base64::engine::general_purpose::STANDARD.encode(PLACEHOLDER_SVG)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait::async_trait]
impl Gateway for StandInGateway {
    fn metadata(&self) -> GatewayMetadata {
        GatewayMetadata {
            name: "stand-in".to_string(),
            live: false,
            transcription_model: "stand-in".to_string(),
            image_model: "stand-in".to_string(),
        }
    }

    async fn transcribe(&self, audio: Bytes, format: &str) -> Result<String, GatewayError> {
        debug!("Stand-in transcription of {} bytes ({})", audio.len(), format);
        pause(self.transcribe_delay).await;
        Ok(STAND_IN_TRANSCRIPT.to_string())
    }

    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage, GatewayError> {
        pause(self.image_delay).await;
        Ok(GeneratedImage::inline(
            Self::placeholder_base64(),
            "image/svg+xml",
        ))
    }
}
