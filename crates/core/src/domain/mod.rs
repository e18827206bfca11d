// Domain Layer - Message protocol and status model

pub mod error;
pub mod message;
pub mod status;

// Re-exports
pub use error::ProtocolViolation;
pub use message::{normalize_error, ByteStream, ParsedFile, WorkerMessage, WorkerRequest};
pub use status::{ErrorEntry, SlotId, SlotState, GENERIC_ERROR_MARKER};
