use super::HistoryEntry;
use thiserror::Error;

/// Why the cursor did not move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Boundary {
    #[error("already at the first entry")]
    First,
    #[error("already at the last entry")]
    Last,
    #[error("history is empty")]
    Empty,
}

/// Position of the entry currently on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryCursor {
    index: Option<usize>,
}

impl HistoryCursor {
    /// Cursor on the newest of `len` entries.
    pub fn latest(len: usize) -> Self {
        Self {
            index: len.checked_sub(1),
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current<'a>(&self, entries: &'a [HistoryEntry]) -> Option<&'a HistoryEntry> {
        self.index.and_then(|i| entries.get(i))
    }

    pub fn previous(&mut self) -> Result<usize, Boundary> {
        match self.index {
            None => Err(Boundary::Empty),
            Some(0) => Err(Boundary::First),
            Some(i) => {
                self.index = Some(i - 1);
                Ok(i - 1)
            }
        }
    }

    pub fn next(&mut self, len: usize) -> Result<usize, Boundary> {
        match self.index {
            None => Err(Boundary::Empty),
            Some(i) if i + 1 >= len => Err(Boundary::Last),
            Some(i) => {
                self.index = Some(i + 1);
                Ok(i + 1)
            }
        }
    }

    pub fn reset_to_latest(&mut self, len: usize) {
        *self = Self::latest(len);
    }

    /// Keeps the cursor inside `0..len` after entries were removed.
    pub fn clamp(&mut self, len: usize) {
        self.index = match (self.index, len) {
            (_, 0) => None,
            (None, len) => Some(len - 1),
            (Some(i), len) => Some(i.min(len - 1)),
        };
    }

    /// `"3 / 7"`, or `"0 / 0"` for an empty history.
    pub fn label(&self, len: usize) -> String {
        match self.index {
            Some(i) if len > 0 => format!("{} / {}", i + 1, len),
            _ => "0 / 0".to_string(),
        }
    }
}
