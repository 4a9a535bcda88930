use crate::media::format_hint;
use crate::server::{
    config::AppState,
    error::{GenerationError, InputError},
    models::{GenerationResponse, Timestamp},
};
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use bytes::{Bytes, BytesMut};
use tracing::{debug, info, warn};

pub const AUDIO_FIELD: &str = "audio";

#[derive(Debug)]
struct AudioUpload {
    bytes: Bytes,
    format: String,
}

/// POST /api/audio-to-image
///
/// Reads the `audio` multipart field, runs it through the generation pipeline
/// and answers with the transcript and a self-contained image. Input problems
/// are rejected before the AI service is contacted.
pub async fn audio_to_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, GenerationError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!("Upload is not multipart: {}", rejection);
        InputError::MissingFile
    })?;

    let upload = read_audio(&mut multipart, state.max_upload_bytes).await?;
    info!(
        "Received audio file: {} bytes, format: {}",
        upload.bytes.len(),
        upload.format
    );

    let output = state.pipeline.run(upload.bytes, &upload.format).await?;

    Ok(Json(GenerationResponse {
        success: true,
        text: output.text,
        image_url: output.image_url,
        image_data: output.image_data,
        timestamp: Timestamp::now(),
    }))
}

async fn read_audio(multipart: &mut Multipart, limit: usize) -> Result<AudioUpload, InputError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let format = format_hint(field.content_type(), field.file_name());
        let bytes = read_limited(field, limit).await?;
        if bytes.is_empty() {
            return Err(InputError::EmptyFile);
        }
        return Ok(AudioUpload { bytes, format });
    }

    Err(InputError::MissingFile)
}

async fn read_limited(mut field: Field<'_>, limit: usize) -> Result<Bytes, InputError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
        if buffer.len() + chunk.len() > limit {
            return Err(InputError::TooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

fn multipart_error(err: MultipartError, limit: usize) -> InputError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        InputError::TooLarge { limit }
    } else {
        InputError::Malformed(err.body_text())
    }
}
