use crate::server::error::{GenerationError, Stage};
use crate::server::services::gateway::{
    Gateway, GatewayError, GatewayMetadata, GeneratedImage, DEFAULT_IMAGE_MIME,
};
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Self-contained result of one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub text: String,
    /// Where the provider hosted the image, empty when it sent the bytes inline.
    pub image_url: String,
    /// `data:` URI holding the image bytes.
    pub image_data: String,
}

/// Audio in, transcript and image out: transcription, then image generation,
/// then, when the provider only sent a link, downloading the image so the
/// result no longer depends on that link.
#[derive(Clone)]
pub struct GenerationPipeline {
    gateway: Arc<dyn Gateway>,
    http: Client,
}

impl GenerationPipeline {
    pub fn new(gateway: Arc<dyn Gateway>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { gateway, http })
    }

    pub fn metadata(&self) -> GatewayMetadata {
        self.gateway.metadata()
    }

    pub async fn run(&self, audio: Bytes, format: &str) -> Result<GenerationOutput, GenerationError> {
        info!("Transcribing {} bytes of {} audio", audio.len(), format);
        let text = self
            .gateway
            .transcribe(audio, format)
            .await
            .map_err(|e| GenerationError::at(Stage::Transcription, e))?;
        info!("Transcript: {}", text);

        let image = self
            .gateway
            .generate_image(&text)
            .await
            .map_err(|e| GenerationError::at(Stage::ImageGeneration, e))?;

        let image_data = self.embed(&image).await?;
        info!("Image ready ({} bytes as data URI)", image_data.len());

        Ok(GenerationOutput {
            text,
            image_url: image.remote_url().unwrap_or_default().to_string(),
            image_data,
        })
    }

    async fn embed(&self, image: &GeneratedImage) -> Result<String, GenerationError> {
        if let Some(payload) = image.inline_data() {
            return inline_data_uri(payload, &image.mime_type);
        }

        let Some(url) = image.remote_url() else {
            return Err(GenerationError::upstream(
                Stage::ImageGeneration,
                "response contained no image",
            ));
        };

        debug!("Downloading generated image from {}", url);
        let (bytes, mime_type) = self
            .download(url)
            .await
            .map_err(|e| GenerationError::at(Stage::ImageDownload, e))?;
        if bytes.is_empty() {
            return Err(GenerationError::upstream(
                Stage::ImageDownload,
                "downloaded image is empty",
            ));
        }

        Ok(data_uri(
            &mime_type,
            &base64::engine::general_purpose::STANDARD.encode(&bytes),
        ))
    }

    async fn download(&self, url: &str) -> Result<(Bytes, String), GatewayError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Image download from {} returned {}", url, status);
            return Err(GatewayError::Upstream(format!(
                "image host returned status {}",
                status.as_u16()
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::trim)
            .filter(|v| v.starts_with("image/"))
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();

        let bytes = response.bytes().await?;
        Ok((bytes, mime_type))
    }
}

pub fn data_uri(mime_type: &str, base64_payload: &str) -> String {
    format!("data:{mime_type};base64,{base64_payload}")
}

/// Builds the data URI for an inline payload, rejecting payloads that are not
/// valid base64. A payload that already is a `data:` URI is passed through.
fn inline_data_uri(payload: &str, mime_type: &str) -> Result<String, GenerationError> {
    let (mime_type, encoded) = match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,").ok_or_else(|| {
            GenerationError::upstream(Stage::ImageGeneration, "inline image is not base64 encoded")
        })?,
        None => (mime_type, payload),
    };
    // Providers may wrap base64 at 76 columns.
    let encoded: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    base64::engine::general_purpose::STANDARD
        .decode(&encoded)
        .map_err(|e| {
            GenerationError::upstream(
                Stage::ImageGeneration,
                format!("inline image is not valid base64: {e}"),
            )
        })?;

    Ok(data_uri(mime_type, &encoded))
}
