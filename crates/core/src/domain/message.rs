// Worker message protocol
//
// Wire shape is a JSON object tagged by `type`:
//   worker -> launcher: ready | file_parsed { file } | file_parse_error { error }
//   launcher -> worker: file_parse_request { data }

use crate::domain::error::ProtocolViolation;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tokio::io::AsyncRead;

/// Streamable byte source handed to the worker.
///
/// Moving it into a [`WorkerRequest`] is the ownership transfer: the sender
/// keeps no handle to read from afterwards.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Result of a successful parse; opaque to the launcher
pub type ParsedFile = Value;

pub const TYPE_READY: &str = "ready";
pub const TYPE_FILE_PARSED: &str = "file_parsed";
pub const TYPE_FILE_PARSE_ERROR: &str = "file_parse_error";
pub const TYPE_FILE_PARSE_REQUEST: &str = "file_parse_request";

/// Messages the worker sends to the launcher
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    Ready,
    FileParsed { file: ParsedFile },
    FileParseError { error: Value },
}

impl WorkerMessage {
    /// Validate a raw channel value into a typed message.
    ///
    /// Extra fields are ignored; a missing payload field is a violation.
    pub fn parse(raw: &Value) -> Result<Self, ProtocolViolation> {
        let object = raw.as_object().ok_or(ProtocolViolation::NotAnObject)?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolViolation::MissingType)?;

        match kind {
            TYPE_READY => Ok(WorkerMessage::Ready),
            TYPE_FILE_PARSED => object
                .get("file")
                .cloned()
                .map(|file| WorkerMessage::FileParsed { file })
                .ok_or(ProtocolViolation::MissingField {
                    kind: TYPE_FILE_PARSED,
                    field: "file",
                }),
            TYPE_FILE_PARSE_ERROR => object
                .get("error")
                .cloned()
                .map(|error| WorkerMessage::FileParseError { error })
                .ok_or(ProtocolViolation::MissingField {
                    kind: TYPE_FILE_PARSE_ERROR,
                    field: "error",
                }),
            other => Err(ProtocolViolation::UnknownType(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkerMessage::Ready => TYPE_READY,
            WorkerMessage::FileParsed { .. } => TYPE_FILE_PARSED,
            WorkerMessage::FileParseError { .. } => TYPE_FILE_PARSE_ERROR,
        }
    }

    pub fn to_value(&self) -> Value {
        // Serializing a derive(Serialize) enum of JSON values cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl TryFrom<Value> for WorkerMessage {
    type Error = ProtocolViolation;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        WorkerMessage::parse(&raw)
    }
}

/// Requests the launcher sends to the worker
pub enum WorkerRequest {
    FileParseRequest { data: ByteStream },
}

impl WorkerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerRequest::FileParseRequest { .. } => TYPE_FILE_PARSE_REQUEST,
        }
    }
}

impl fmt::Debug for WorkerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRequest::FileParseRequest { .. } => f
                .debug_struct("FileParseRequest")
                .field("data", &"<stream>")
                .finish(),
        }
    }
}

/// Reduce a worker-reported error to its message text.
///
/// Strings pass through, objects with a string `message` yield that message,
/// anything else is rendered as JSON.
pub fn normalize_error(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(object) => match object.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => error.to_string(),
        },
        other => other.to_string(),
    }
}
