// Central Error Type for the Launcher

use thiserror::Error;

/// Application-level error type
///
/// Every bootstrap task fails with this type, so the orchestrator can join
/// heterogeneous subsystems and still hand back the failing task's own error.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Status error: {0}")]
    Status(#[from] crate::port::StatusError),

    #[error("Worker handshake failed: {0}")]
    Handshake(#[from] crate::application::handshake::HandshakeError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] crate::application::bridge::BridgeError),

    #[error("{0}")]
    Core(String),

    #[error("{0}")]
    Asset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
