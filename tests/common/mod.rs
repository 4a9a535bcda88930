#![allow(dead_code)]

use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use voicepaint::configuration::MAX_UPLOAD_BYTES;
use voicepaint::server::services::{
    Gateway, GatewayError, GatewayMetadata, GeneratedImage, GenerationPipeline,
};
use voicepaint::server::{app_router, AppState};

pub const BOUNDARY: &str = "voicepaint-test-boundary";
pub const FRONTEND: &str = "http://localhost:3000";

/// Gateway with canned answers that counts how often it was called.
pub struct ScriptedGateway {
    transcript: Result<String, GatewayError>,
    image: Result<GeneratedImage, GatewayError>,
    pub transcribe_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub last_format: std::sync::Mutex<Option<String>>,
}

impl ScriptedGateway {
    pub fn new(
        transcript: Result<String, GatewayError>,
        image: Result<GeneratedImage, GatewayError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            transcript,
            image,
            transcribe_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            last_format: std::sync::Mutex::new(None),
        })
    }

    pub fn transcribe_calls(&self) -> usize {
        self.transcribe_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn last_format(&self) -> Option<String> {
        self.last_format.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Gateway for ScriptedGateway {
    fn metadata(&self) -> GatewayMetadata {
        GatewayMetadata {
            name: "scripted".to_string(),
            live: false,
            transcription_model: "scripted".to_string(),
            image_model: "scripted".to_string(),
        }
    }

    async fn transcribe(&self, _audio: Bytes, format: &str) -> Result<String, GatewayError> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_format.lock().unwrap() = Some(format.to_string());
        self.transcript.clone()
    }

    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage, GatewayError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.image.clone()
    }
}

pub fn pipeline(gateway: Arc<dyn Gateway>) -> GenerationPipeline {
    GenerationPipeline::new(gateway, Duration::from_secs(5)).unwrap()
}

pub fn router(gateway: Arc<dyn Gateway>, max_upload_bytes: usize) -> axum::Router {
    app_router(AppState::new(pipeline(gateway), max_upload_bytes), FRONTEND)
}

/// Serves the app on an ephemeral port and returns its base URL.
pub async fn spawn_app(gateway: Arc<dyn Gateway>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(gateway, MAX_UPLOAD_BYTES);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub struct FormPart<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> FormPart<'a> {
    pub fn audio(data: &'a [u8], content_type: &'a str) -> Self {
        Self {
            name: "audio",
            file_name: Some("recording.webm"),
            content_type: Some(content_type),
            data,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }
}

pub fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{file_name}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(body: Vec<u8>) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri("/api/audio-to-image")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(body))
        .unwrap()
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
