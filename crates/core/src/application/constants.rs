// Launcher constants (no magic values)
use std::time::Duration;

/// Minimum time the splash/status surface stays visible (800ms)
pub const DEFAULT_MIN_SPLASH_DURATION: Duration = Duration::from_millis(800);

/// Status slot bound to the application core task
pub const CORE_SLOT: &str = "splash_core";
pub const CORE_LABEL: &str = "Application Core";

/// Status slot bound to the worker handshake task
pub const WORKER_SLOT: &str = "splash_worker";
pub const WORKER_LABEL: &str = "File Loader";

/// Status slot bound to the static asset task
pub const ASSETS_SLOT: &str = "splash_assets";
pub const ASSETS_LABEL: &str = "Assets";

/// Outbound request buffer (submissions are serialized)
pub const REQUEST_CHANNEL_CAPACITY: usize = 4;

/// Inbound worker event buffer
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Application submission buffer (dropped files waiting for the bridge)
pub const SUBMISSION_CHANNEL_CAPACITY: usize = 16;

/// Largest submitted file a worker adapter will read (64 MiB)
pub const MAX_SUBMISSION_BYTES: u64 = 64 * 1024 * 1024;

/// Longest single stdout line accepted from a subprocess worker (64 MiB)
pub const MAX_WORKER_LINE_BYTES: u64 = 64 * 1024 * 1024;
