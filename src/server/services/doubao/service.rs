use super::types::{ImageGenerationRequest, ImageGenerationResponse, TranscriptionResponse};
use crate::configuration::AiSettings;
use crate::server::services::gateway::{
    Gateway, GatewayError, GatewayMetadata, GeneratedImage, DEFAULT_IMAGE_MIME,
};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Live gateway for the Doubao (Volcano Ark) OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct DoubaoGateway {
    client: Client,
    api_key: Secret<String>,
    base_url: String,
    transcription_model: String,
    image_model: String,
    image_size: String,
}

impl DoubaoGateway {
    pub fn new(
        api_key: Secret<String>,
        settings: &AiSettings,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.clone(),
            transcription_model: settings.transcription_model.clone(),
            image_model: settings.image_model.clone(),
            image_size: settings.image_size.clone(),
        })
    }

    pub fn with_base_url(
        api_key: Secret<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let settings = AiSettings {
            base_url: base_url.into(),
            ..AiSettings::default()
        };
        Self::new(
            api_key,
            &settings,
            Duration::from_secs(crate::configuration::REQUEST_TIMEOUT_SECS),
        )
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("AI service error ({}): {}", status, body);
        Err(GatewayError::Upstream(upstream_message(status, &body)))
    }
}

/// Picks the provider's own error message out of an error body, falling back
/// to a generic status line.
pub(crate) fn upstream_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        value["error"]["message"]
            .as_str()
            .or_else(|| value["error"].as_str())
            .or_else(|| value["message"].as_str())
            .map(str::to_string)
    });

    match message {
        Some(message) if !message.trim().is_empty() => message,
        _ => format!("service returned status {}", status.as_u16()),
    }
}

#[async_trait::async_trait]
impl Gateway for DoubaoGateway {
    fn metadata(&self) -> GatewayMetadata {
        GatewayMetadata {
            name: "doubao".to_string(),
            live: true,
            transcription_model: self.transcription_model.clone(),
            image_model: self.image_model.clone(),
        }
    }

    async fn transcribe(&self, audio: Bytes, format: &str) -> Result<String, GatewayError> {
        debug!(
            "Transcribing {} bytes of {} with {}",
            audio.len(),
            format,
            self.transcription_model
        );

        let part = Part::bytes(audio.to_vec())
            .file_name(format!("audio.{format}"))
            .mime_str(&format!("audio/{format}"))?;
        let form = Form::new()
            .part("audio", part)
            .text("model", self.transcription_model.clone());

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let body: TranscriptionResponse = response.json().await?;
        body.into_text()
            .ok_or_else(|| GatewayError::Upstream("no speech was recognized".to_string()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, GatewayError> {
        debug!("Generating image with {}", self.image_model);

        let request = ImageGenerationRequest {
            model: self.image_model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.image_size.clone(),
        };

        let response = self
            .client
            .post(self.url("images/generations"))
            .header("Authorization", self.bearer())
            .json(&request)
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let body: ImageGenerationResponse = response.json().await?;
        let first = body.data.into_iter().next();
        let (url, b64_json) = match first {
            Some(image) => (image.url.or(body.url), image.b64_json),
            None => (body.url, None),
        };

        Ok(GeneratedImage {
            url,
            b64_json,
            mime_type: DEFAULT_IMAGE_MIME.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_prefers_nested_error() {
        let body = r#"{"error":{"message":"quota exhausted","type":"billing"}}"#;
        assert_eq!(
            upstream_message(StatusCode::TOO_MANY_REQUESTS, body),
            "quota exhausted"
        );
    }

    #[test]
    fn upstream_message_accepts_flat_error() {
        let body = r#"{"error":"bad audio"}"#;
        assert_eq!(upstream_message(StatusCode::BAD_REQUEST, body), "bad audio");
    }

    #[test]
    fn upstream_message_falls_back_to_status() {
        assert_eq!(
            upstream_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "service returned status 502"
        );
    }

    #[test]
    fn url_joins_without_double_slash() {
        let gateway =
            DoubaoGateway::with_base_url(Secret::new("k".to_string()), "http://host/api/v3/")
                .unwrap();
        assert_eq!(
            gateway.url("/images/generations"),
            "http://host/api/v3/images/generations"
        );
    }
}
