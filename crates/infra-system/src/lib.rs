// ptimer Infrastructure - System Adapters
// Implements: WorkerSpawner (thread, subprocess), StatusReporter, AssetLoader, FileParser

pub mod dir_assets;
pub mod json_parser;
pub mod status_board;
pub mod subprocess_worker;
mod submission;
pub mod thread_worker;

pub use dir_assets::DirAssetLoader;
pub use json_parser::JsonDocumentParser;
pub use status_board::StatusBoard;
pub use subprocess_worker::SubprocessWorkerSpawner;
pub use thread_worker::ThreadWorkerSpawner;
