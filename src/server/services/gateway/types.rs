use serde::{Deserialize, Serialize};

/// Metadata describing a gateway's capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMetadata {
    /// Name of the gateway provider
    pub name: String,
    /// Whether calls leave the process
    pub live: bool,
    /// Model used for speech-to-text
    pub transcription_model: String,
    /// Model used for text-to-image
    pub image_model: String,
}

/// Raw image returned by a gateway, before the pipeline makes it self-contained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Remote location of the image, when the provider hosts it
    pub url: Option<String>,
    /// Inline base64 payload, without any `data:` prefix
    pub b64_json: Option<String>,
    /// MIME type of the inline payload
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn inline(b64_json: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            url: None,
            b64_json: Some(b64_json.into()),
            mime_type: mime_type.into(),
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            b64_json: None,
            mime_type: DEFAULT_IMAGE_MIME.to_string(),
        }
    }

    /// Inline payload, if the provider sent a non-empty one.
    pub fn inline_data(&self) -> Option<&str> {
        self.b64_json.as_deref().filter(|data| !data.is_empty())
    }

    /// Remote URL, if the provider sent a non-empty one.
    pub fn remote_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

pub const DEFAULT_IMAGE_MIME: &str = "image/png";
