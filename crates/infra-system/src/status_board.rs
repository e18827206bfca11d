// In-memory status surface
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::info;

use ptimer_core::domain::{ErrorEntry, SlotState};
use ptimer_core::port::{StatusError, StatusReporter, TimeProvider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub state: SlotState,
    pub updated_at: i64,
}

/// Status surface with a fixed set of bound slots and an error list.
///
/// The presentation layer reads it through [`StatusBoard::snapshot`] and
/// [`StatusBoard::errors`].
pub struct StatusBoard {
    slots: RwLock<BTreeMap<String, SlotRecord>>,
    errors: RwLock<Vec<ErrorEntry>>,
    time_provider: Arc<dyn TimeProvider>,
}

impl StatusBoard {
    /// Bind `slots`, all starting Pending
    pub fn new<S: AsRef<str>>(slots: &[S], time_provider: Arc<dyn TimeProvider>) -> Self {
        let now = time_provider.now_millis();
        let slots = slots
            .iter()
            .map(|slot| {
                (
                    slot.as_ref().to_string(),
                    SlotRecord {
                        state: SlotState::Pending,
                        updated_at: now,
                    },
                )
            })
            .collect();
        Self {
            slots: RwLock::new(slots),
            errors: RwLock::new(Vec::new()),
            time_provider,
        }
    }

    pub fn state(&self, slot: &str) -> Option<SlotState> {
        self.read_slots().get(slot).map(|record| record.state.clone())
    }

    pub fn snapshot(&self) -> Vec<(String, SlotRecord)> {
        self.read_slots()
            .iter()
            .map(|(slot, record)| (slot.clone(), record.clone()))
            .collect()
    }

    pub fn errors(&self) -> Vec<ErrorEntry> {
        self.errors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn read_slots(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, SlotRecord>> {
        self.slots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set(&self, slot: &str, state: SlotState) -> Result<(), StatusError> {
        let mut slots = self
            .slots
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let record = slots
            .get_mut(slot)
            .ok_or_else(|| StatusError::BindingNotFound(slot.to_string()))?;

        info!(slot = %slot, state = state.as_str(), "Status updated");
        record.state = state;
        record.updated_at = self.time_provider.now_millis();
        Ok(())
    }
}

impl StatusReporter for StatusBoard {
    fn set_pending(&self, slot: &str) -> Result<(), StatusError> {
        self.set(slot, SlotState::Pending)
    }

    fn set_ready(&self, slot: &str) -> Result<(), StatusError> {
        self.set(slot, SlotState::Ready)
    }

    fn set_error(&self, slot: &str, marker: &str) -> Result<(), StatusError> {
        self.set(slot, SlotState::Error(marker.to_string()))
    }

    fn push_error(&self, entry: ErrorEntry) {
        self.errors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
    }
}
