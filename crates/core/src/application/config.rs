// Launcher configuration
use crate::application::constants::*;
use std::time::Duration;

/// Status binding and display label of one bootstrap task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSlot {
    pub slot: String,
    pub label: Option<String>,
}

impl TaskSlot {
    pub fn new(slot: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            slot: slot.into(),
            label: label.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub min_splash: Duration,
    pub core: TaskSlot,
    pub worker: TaskSlot,
    pub assets: TaskSlot,
}

impl LauncherConfig {
    /// Slot ids the status surface must bind before bootstrap
    pub fn slot_ids(&self) -> [&str; 3] {
        [&self.core.slot, &self.worker.slot, &self.assets.slot]
    }

    pub fn with_min_splash(mut self, min_splash: Duration) -> Self {
        self.min_splash = min_splash;
        self
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            min_splash: DEFAULT_MIN_SPLASH_DURATION,
            core: TaskSlot::new(CORE_SLOT, Some(CORE_LABEL)),
            worker: TaskSlot::new(WORKER_SLOT, Some(WORKER_LABEL)),
            assets: TaskSlot::new(ASSETS_SLOT, Some(ASSETS_LABEL)),
        }
    }
}
