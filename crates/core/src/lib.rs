// ptimer Core - Startup orchestration, worker handshake & request bridge
// NO infrastructure dependencies: processes, filesystem and terminal live in adapters

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
