// Application Layer - Startup orchestration and the worker bridge

pub mod bridge;
pub mod config;
pub mod constants;
pub mod gate;
pub mod handshake;
pub mod orchestrator;
mod panic_guard;
pub mod session;
pub mod shutdown;
pub mod task_runner;

// Re-exports
pub use bridge::{Bridge, BridgeError, BridgeState};
pub use config::{LauncherConfig, TaskSlot};
pub use gate::MinimumDurationGate;
pub use handshake::{HandshakeError, ReadyWorker, WorkerHandshake};
pub use orchestrator::{BootTask, Orchestrator};
pub use session::{Launcher, Session, SessionOutcome, Subsystem};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use task_runner::TaskRunner;
