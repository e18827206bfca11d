// Domain Error Types

use thiserror::Error;

/// A worker message that does not match any recognized kind/shape.
///
/// Always non-fatal: callers log it and drop the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("message is not an object")]
    NotAnObject,

    #[error("message has no string `type` field")]
    MissingType,

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("`{kind}` message is missing field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}
