// File parser port (runs inside the worker, never on the launcher's task)
use crate::domain::ParsedFile;
use serde::Serialize;
use thiserror::Error;

/// Parse failure reported back as a `file_parse_error` message
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ParseError {
    pub name: String,
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "ParseError".to_string(),
            message: message.into(),
        }
    }
}

/// Format-specific parsing logic. Blocking is fine; workers call it off the
/// async executor.
pub trait FileParser: Send + Sync + 'static {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedFile, ParseError>;
}
