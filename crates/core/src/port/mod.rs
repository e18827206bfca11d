// Port Layer - Interfaces for external collaborators

pub mod app;
pub mod asset_loader;
pub mod file_parser;
pub mod status_reporter;
pub mod time_provider; // For deterministic timestamps
pub mod worker_spawner;

// Re-exports
pub use app::{AppCore, AppHandle, AppLoader, AppSink};
pub use asset_loader::{AssetBundle, AssetEntry, AssetLoader};
pub use file_parser::{FileParser, ParseError};
pub use status_reporter::{StatusError, StatusReporter};
pub use time_provider::TimeProvider;
pub use worker_spawner::{SpawnError, WorkerChannel, WorkerEvent, WorkerSpawner};
