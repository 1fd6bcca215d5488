//! Registry slot state.

use serde::{Deserialize, Serialize};

/// Observable state of a registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    /// Never populated.
    Empty,
    /// Populated and in use.
    Live,
    /// Populated, then logically deleted. The record is kept so ids held in
    /// other clusters still resolve, as dead.
    Tombstoned,
}

/// One arena slot.
///
/// Records are boxed so that a mostly-empty arena costs one pointer per id.
#[derive(Debug, Clone)]
pub enum Slot<T> {
    /// Never populated.
    Empty,
    /// In use.
    Live(Box<T>),
    /// Logically deleted.
    Tombstoned(Box<T>),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> Slot<T> {
    /// Current state.
    pub fn state(&self) -> SlotState {
        match self {
            Self::Empty => SlotState::Empty,
            Self::Live(_) => SlotState::Live,
            Self::Tombstoned(_) => SlotState::Tombstoned,
        }
    }

    /// True if live.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    /// The record, only if live.
    pub fn live(&self) -> Option<&T> {
        match self {
            Self::Live(record) => Some(&**record),
            _ => None,
        }
    }

    /// The record mutably, only if live.
    pub fn live_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Live(record) => Some(&mut **record),
            _ => None,
        }
    }

    /// The record whether live or tombstoned.
    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Live(record) | Self::Tombstoned(record) => Some(&**record),
        }
    }

    /// Move a live record to the tombstoned state. Returns false if the slot
    /// was not live.
    pub fn tombstone(&mut self) -> bool {
        match std::mem::take(self) {
            Self::Live(record) => {
                *self = Self::Tombstoned(record);
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }
}
