// Status slot model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a status slot (e.g. "splash_core")
pub type SlotId = String;

/// Marker written into a failed slot when its task has no label
pub const GENERIC_ERROR_MARKER: &str = "ERROR";

/// Progress of one bootstrap task as seen by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "label", rename_all = "snake_case")]
pub enum SlotState {
    Pending,
    Ready,
    /// Failed; carries the task label or [`GENERIC_ERROR_MARKER`]
    Error(String),
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotState::Pending => "Pending",
            SlotState::Ready => "Ready",
            SlotState::Error(_) => "Error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SlotState::Error(_))
    }
}

/// One line of the visible startup error list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub label: Option<String>,
    pub message: String,
}

impl ErrorEntry {
    pub fn new(label: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            label: label.map(str::to_string),
            message: message.into(),
        }
    }

    /// Heading shown before the message: `ERROR (label)` or `ERROR`
    pub fn heading(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({})", GENERIC_ERROR_MARKER, label),
            None => GENERIC_ERROR_MARKER.to_string(),
        }
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.heading(), self.message)
    }
}
