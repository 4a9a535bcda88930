use super::{ApiClient, ClientError};
use crate::history::{Boundary, HistoryCursor, HistoryEntry, HistoryLog, KeyValueStore};
use crate::recording::{CaptureSession, Recorder, RecordingError};
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a recording or generation is already in progress")]
    Busy,

    #[error("no recording in progress")]
    NotRecording,

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Recording,
    Processing,
}

/// One user's loop of record → generate → browse history.
///
/// Only one recording or generation runs at a time; every failure returns the
/// session to [`SessionState::Ready`] without touching the history.
pub struct GenerationSession<S> {
    client: ApiClient,
    history: HistoryLog<S>,
    recorder: Recorder,
    capture: Option<CaptureSession>,
    state: SessionState,
    entries: Vec<HistoryEntry>,
    cursor: HistoryCursor,
    last_id: i64,
}

impl<S: KeyValueStore> GenerationSession<S> {
    pub fn new(client: ApiClient, history: HistoryLog<S>) -> Self {
        let entries = history.load();
        let last_id = entries.iter().map(|e| e.id).max().unwrap_or(0);
        let cursor = HistoryCursor::latest(entries.len());
        info!("Loaded {} history entries", entries.len());

        Self {
            client,
            history,
            recorder: Recorder::new(),
            capture: None,
            state: SessionState::Ready,
            entries,
            cursor,
            last_id,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.current(&self.entries)
    }

    pub fn position_label(&self) -> String {
        self.cursor.label(self.entries.len())
    }

    pub fn start_recording(&mut self, mime_type: &str) -> Result<(), SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::Busy);
        }
        self.capture = Some(self.recorder.begin(mime_type)?);
        self.state = SessionState::Recording;
        Ok(())
    }

    pub fn push_audio(&mut self, chunk: &[u8]) -> Result<(), SessionError> {
        let capture = self.capture.as_mut().ok_or(SessionError::NotRecording)?;
        capture.push(chunk);
        Ok(())
    }

    /// Ends the capture, uploads it and records the result in the history.
    pub async fn stop_and_generate(&mut self) -> Result<HistoryEntry, SessionError> {
        if self.state == SessionState::Processing {
            return Err(SessionError::Busy);
        }
        let capture = self.capture.take().ok_or(SessionError::NotRecording)?;

        let blob = match self.recorder.end(capture) {
            Ok(blob) => blob,
            Err(e) => {
                self.state = SessionState::Ready;
                return Err(e.into());
            }
        };

        self.state = SessionState::Processing;
        let result = self.client.audio_to_image(&blob).await;
        self.state = SessionState::Ready;

        let response = result.map_err(|e| {
            warn!("Generation failed: {}", e);
            e
        })?;

        let entry = HistoryEntry::from_response(self.next_id(), &response);
        self.entries = self.history.append(entry.clone());
        self.cursor.reset_to_latest(self.entries.len());
        info!("Generated entry {} ({})", entry.id, self.position_label());
        Ok(entry)
    }

    /// Abandons a recording, or a generation whose future was dropped.
    pub fn cancel(&mut self) {
        if let Some(capture) = self.capture.take() {
            let _ = self.recorder.end(capture);
        }
        self.state = SessionState::Ready;
    }

    pub fn previous(&mut self) -> Result<&HistoryEntry, Boundary> {
        let index = self.cursor.previous()?;
        Ok(&self.entries[index])
    }

    pub fn next(&mut self) -> Result<&HistoryEntry, Boundary> {
        let index = self.cursor.next(self.entries.len())?;
        Ok(&self.entries[index])
    }

    pub fn delete(&mut self, id: i64) {
        self.entries = self.history.delete_item(id);
        self.cursor.clamp(self.entries.len());
    }

    pub fn delete_current(&mut self) -> Option<HistoryEntry> {
        let entry = self.current()?.clone();
        self.delete(entry.id);
        Some(entry)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.entries.clear();
        self.cursor = HistoryCursor::default();
    }

    /// Wall-clock id, bumped past the previous one when the clock has not moved.
    fn next_id(&mut self) -> i64 {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }
}
