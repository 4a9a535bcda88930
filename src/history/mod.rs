//! Bounded history of generation results.
//!
//! The log is a convenience cache, not a source of truth: every persistence
//! failure is logged and degrades to an empty history or an unsaved entry,
//! and nothing here returns an error to the caller.

pub mod cursor;
pub mod store;

pub use cursor::{Boundary, HistoryCursor};
pub use store::{FailureMode, FileStore, KeyValueStore, MemoryStore, StoreError};

use crate::server::models::GenerationResponse;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Most entries kept in a snapshot.
pub const MAX_HISTORY: usize = 50;
/// Key the snapshot lives under.
pub const STORAGE_KEY: &str = "audioToImageHistory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Creation time in milliseconds since the epoch.
    pub id: i64,
    pub text: String,
    /// `data:` URI, or empty.
    #[serde(default)]
    pub image_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// ISO-8601.
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn from_response(id: i64, response: &GenerationResponse) -> Self {
        Self {
            id,
            text: response.text.clone(),
            image_data: response.image_data.clone(),
            image_url: Some(response.image_url.clone()).filter(|url| !url.is_empty()),
            timestamp: response.timestamp.to_iso_string(),
        }
    }
}

/// Last `n` entries of `entries`.
fn tail(entries: &[HistoryEntry], n: usize) -> &[HistoryEntry] {
    &entries[entries.len().saturating_sub(n)..]
}

pub struct HistoryLog<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> HistoryLog<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The persisted snapshot; empty when absent, unreadable or corrupt.
    pub fn load(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Failed to load history: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding corrupt history snapshot: {}", e);
                Vec::new()
            }
        }
    }

    /// Persists the last [`MAX_HISTORY`] entries. If the store is full, retries
    /// once with half as many; if that fails too the save is dropped.
    pub fn save(&self, entries: &[HistoryEntry]) {
        let retained = tail(entries, MAX_HISTORY);
        let err = match self.write(retained) {
            Ok(()) => {
                debug!("Saved {} history entries", retained.len());
                return;
            }
            Err(e) => e,
        };

        if !err.is_capacity_exceeded() {
            error!("Failed to save history: {}", err);
            return;
        }

        let reduced = tail(entries, MAX_HISTORY / 2);
        warn!(
            "History store is full ({}), retrying with {} entries",
            err,
            reduced.len()
        );
        if let Err(e) = self.write(reduced) {
            error!("History still does not fit after trimming, not saved: {}", e);
        }
    }

    /// Removes the snapshot. Safe to call when nothing is stored.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            error!("Failed to clear history: {}", e);
        }
    }

    /// Drops the entry with `id`, if any, and returns what remains.
    pub fn delete_item(&self, id: i64) -> Vec<HistoryEntry> {
        let mut entries = self.load();
        entries.retain(|entry| entry.id != id);
        self.save(&entries);
        entries
    }

    /// Adds `entry` after the newest one and returns the retained entries.
    pub fn append(&self, entry: HistoryEntry) -> Vec<HistoryEntry> {
        let mut entries = self.load();
        entries.push(entry);
        self.save(&entries);
        tail(&entries, MAX_HISTORY).to_vec()
    }

    fn write(&self, entries: &[HistoryEntry]) -> Result<(), StoreError> {
        let json = serde_json::to_string(entries)?;
        self.store.set(&self.key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64) -> HistoryEntry {
        HistoryEntry {
            id,
            text: format!("entry {id}"),
            image_data: String::new(),
            image_url: None,
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn snapshot_uses_camel_case_fields() {
        let mut e = entry(7);
        e.image_data = "data:image/png;base64,AA==".to_string();
        e.image_url = Some("https://img/7.png".to_string());

        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["imageData"], "data:image/png;base64,AA==");
        assert_eq!(json["imageUrl"], "https://img/7.png");
        assert!(json.get("image_data").is_none());
    }

    #[test]
    fn missing_optional_fields_load() {
        let log = HistoryLog::new(MemoryStore::new());
        log.store()
            .set(STORAGE_KEY, r#"[{"id":1,"text":"hi","timestamp":"t"}]"#)
            .unwrap();

        let loaded = log.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].image_data, "");
        assert_eq!(loaded[0].image_url, None);
    }

    #[test]
    fn tail_handles_short_inputs() {
        let entries: Vec<_> = (1..=3).map(entry).collect();
        assert_eq!(tail(&entries, 50).len(), 3);
        assert_eq!(tail(&entries, 2)[0].id, 2);
        assert!(tail(&[], 5).is_empty());
    }
}
