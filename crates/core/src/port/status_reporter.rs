// Status surface port
use crate::domain::{ErrorEntry, SlotState};
use thiserror::Error;

/// Status surface errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// The slot has no pre-existing binding on the status surface.
    /// Treated as a startup configuration fault.
    #[error("Status binding not found: slot '{0}' does not exist")]
    BindingNotFound(String),
}

/// Status reporter port
///
/// Slots are bound before orchestration begins; writing to an unknown slot
/// fails with [`StatusError::BindingNotFound`].
pub trait StatusReporter: Send + Sync {
    fn set_pending(&self, slot: &str) -> Result<(), StatusError>;

    fn set_ready(&self, slot: &str) -> Result<(), StatusError>;

    /// Mark a slot failed; `marker` is the task label or a generic marker
    fn set_error(&self, slot: &str, marker: &str) -> Result<(), StatusError>;

    /// Append an entry to the visible error list
    fn push_error(&self, entry: ErrorEntry);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records every transition so tests can assert on ordering
    pub struct RecordingStatusReporter {
        slots: Mutex<HashMap<String, SlotState>>,
        history: Mutex<Vec<(String, SlotState)>>,
        errors: Mutex<Vec<ErrorEntry>>,
    }

    impl RecordingStatusReporter {
        pub fn new(slots: &[&str]) -> Self {
            Self {
                slots: Mutex::new(
                    slots
                        .iter()
                        .map(|slot| (slot.to_string(), SlotState::Pending))
                        .collect(),
                ),
                history: Mutex::new(Vec::new()),
                errors: Mutex::new(Vec::new()),
            }
        }

        pub fn state(&self, slot: &str) -> Option<SlotState> {
            self.slots.lock().unwrap().get(slot).cloned()
        }

        pub fn history(&self) -> Vec<(String, SlotState)> {
            self.history.lock().unwrap().clone()
        }

        pub fn errors(&self) -> Vec<ErrorEntry> {
            self.errors.lock().unwrap().clone()
        }

        fn set(&self, slot: &str, state: SlotState) -> Result<(), StatusError> {
            let mut slots = self.slots.lock().unwrap();
            let current = slots
                .get_mut(slot)
                .ok_or_else(|| StatusError::BindingNotFound(slot.to_string()))?;
            *current = state.clone();
            self.history.lock().unwrap().push((slot.to_string(), state));
            Ok(())
        }
    }

    impl StatusReporter for RecordingStatusReporter {
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
            self.errors.lock().unwrap().push(entry);
        }
    }
}
