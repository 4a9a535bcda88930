//! Two-phase audio capture: `begin` hands out a session handle that buffers
//! chunks as they arrive, `end` turns the handle back into a single blob.

use crate::media::format_hint;
use bytes::{Bytes, BytesMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordingError {
    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("session {0} does not belong to this recorder or has already ended")]
    UnknownSession(u64),

    #[error("nothing was recorded")]
    NoAudio,
}

/// Finalized recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl AudioBlob {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Container name for the upload, e.g. `webm`.
    pub fn format(&self) -> String {
        format_hint(Some(&self.mime_type), None)
    }

    /// File name the blob is uploaded under.
    pub fn file_name(&self) -> String {
        format!("recording.{}", self.format())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Handle for an active capture. Chunks pushed here are only assembled when
/// the session is handed back to [`Recorder::end`].
#[derive(Debug)]
pub struct CaptureSession {
    id: u64,
    mime_type: String,
    buffer: BytesMut,
    chunks: usize,
    started: Instant,
}

impl CaptureSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.buffer.extend_from_slice(chunk);
        self.chunks += 1;
    }

    pub fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }
}

/// Session ids are unique across all recorders in the process, so a handle
/// can only ever match the recorder that issued it.
static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Owns at most one active capture session at a time.
#[derive(Debug, Default)]
pub struct Recorder {
    active: Option<u64>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn begin(&mut self, mime_type: impl Into<String>) -> Result<CaptureSession, RecordingError> {
        if self.active.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        self.active = Some(id);

        let mime_type = mime_type.into();
        debug!("Recording session {} started ({})", id, mime_type);
        Ok(CaptureSession {
            id,
            mime_type,
            buffer: BytesMut::new(),
            chunks: 0,
            started: Instant::now(),
        })
    }

    /// Finalizes `session`. The recorder is free again afterwards, even when
    /// nothing was captured.
    pub fn end(&mut self, session: CaptureSession) -> Result<AudioBlob, RecordingError> {
        if self.active != Some(session.id) {
            return Err(RecordingError::UnknownSession(session.id));
        }
        self.active = None;

        if session.buffer.is_empty() {
            return Err(RecordingError::NoAudio);
        }

        info!(
            "Recording session {} finished: {} bytes in {} chunks over {:?}",
            session.id,
            session.buffer.len(),
            session.chunks,
            session.started.elapsed()
        );
        Ok(AudioBlob {
            bytes: session.buffer.freeze(),
            mime_type: session.mime_type,
        })
    }
}
