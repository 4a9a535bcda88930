//! Client for the upload endpoint and the recording → upload → history loop.

pub mod session;

pub use session::{GenerationSession, SessionError, SessionState};

use crate::configuration::REQUEST_TIMEOUT_SECS;
use crate::recording::AudioBlob;
use crate::server::handlers::audio_to_image::AUDIO_FIELD;
use crate::server::models::{GenerationResponse, HealthResponse};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server rejected the upload itself.
    #[error("{0}")]
    Input(String),

    /// The server answered with a failure, usually relayed from the AI service.
    #[error("{0}")]
    Upstream(String),

    /// No response was received.
    #[error("network error, check that the backend service is running ({0})")]
    Network(String),

    #[error("the request timed out")]
    Timeout,

    #[error("unexpected response from server: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    server_url: String,
}

impl ApiClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(server_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            server_url: server_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        let base = self.server_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Uploads a recording and returns the generated transcript and image.
    pub async fn audio_to_image(&self, blob: &AudioBlob) -> Result<GenerationResponse, ClientError> {
        if blob.is_empty() {
            return Err(ClientError::Input("nothing was recorded".to_string()));
        }

        let part = Part::bytes(blob.bytes.to_vec())
            .file_name(blob.file_name())
            .mime_str(&blob.mime_type)
            .map_err(|e| ClientError::Input(format!("invalid MIME type {:?}: {e}", blob.mime_type)))?;
        let form = Form::new().part(AUDIO_FIELD, part);

        info!("Uploading {} bytes of {}", blob.len(), blob.mime_type);
        let response = self
            .http
            .post(self.url("api/audio-to-image"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Upload failed: {}", e);
                ClientError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Server answered {} ({} bytes)", status, body.len());
        parse_generation(status, &body)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self.http.get(self.url("health")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Upstream(format!("health check returned {status}")));
        }
        Ok(response.json().await?)
    }
}

fn parse_generation(status: StatusCode, body: &str) -> Result<GenerationResponse, ClientError> {
    let value: Option<Value> = serde_json::from_str(body).ok();
    let succeeded = value
        .as_ref()
        .and_then(|v| v["success"].as_bool())
        .unwrap_or(false);

    if status.is_success() && succeeded {
        return serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()));
    }

    let message = value
        .as_ref()
        .and_then(|v| v["error"].as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string);

    if status.is_client_error() {
        Err(ClientError::Input(
            message.unwrap_or_else(|| format!("upload rejected ({status})")),
        ))
    } else if status.is_success() {
        Err(ClientError::Upstream(
            message.unwrap_or_else(|| "processing failed".to_string()),
        ))
    } else {
        Err(ClientError::Upstream(
            message.unwrap_or_else(|| "server error".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_bodies_keep_server_message() {
        let err = parse_generation(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"success":false,"error":"transcription failed: quota"}"#,
        )
        .unwrap_err();
        assert_eq!(err, ClientError::Upstream("transcription failed: quota".to_string()));

        let err = parse_generation(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"error":"no audio file received"}"#,
        )
        .unwrap_err();
        assert_eq!(err, ClientError::Input("no audio file received".to_string()));
    }

    #[test]
    fn unreadable_error_bodies_get_generic_messages() {
        let err = parse_generation(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert_eq!(err, ClientError::Upstream("server error".to_string()));

        let err = parse_generation(StatusCode::OK, r#"{"success":false}"#).unwrap_err();
        assert_eq!(err, ClientError::Upstream("processing failed".to_string()));
    }

    #[test]
    fn success_body_decodes() {
        let body = r#"{"success":true,"text":"hi","imageUrl":"","imageData":"data:image/png;base64,AA==","timestamp":"2024-01-01T00:00:00.000Z"}"#;
        let response = parse_generation(StatusCode::OK, body).unwrap();
        assert_eq!(response.text, "hi");
        assert_eq!(response.image_data, "data:image/png;base64,AA==");
    }
}
