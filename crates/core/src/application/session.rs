// Launcher & Session
//
// The launcher runs the three bootstrap tasks (application core, worker
// handshake, assets) under the orchestrator, then initialises the
// application and hands the worker to a bridge. The resulting Session owns
// both explicitly; there is no process-wide worker or application.
use crate::application::bridge::{Bridge, BridgeState};
use crate::application::config::LauncherConfig;
use crate::application::gate::MinimumDurationGate;
use crate::application::handshake::{ReadyWorker, WorkerHandshake};
use crate::application::orchestrator::{BootTask, Orchestrator};
use crate::application::shutdown::ShutdownToken;
use crate::domain::ByteStream;
use crate::error::{AppError, Result};
use crate::port::{AppCore, AppLoader, AssetBundle, AssetLoader, StatusReporter, WorkerSpawner};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Output of one bootstrap task
pub enum Subsystem {
    Core(Box<dyn AppCore>),
    Worker(ReadyWorker),
    Assets(AssetBundle),
}

impl Subsystem {
    fn name(&self) -> &'static str {
        match self {
            Subsystem::Core(_) => "core",
            Subsystem::Worker(_) => "worker",
            Subsystem::Assets(_) => "assets",
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Degraded(String),
}

pub struct Launcher {
    config: LauncherConfig,
    status: Arc<dyn StatusReporter>,
    app_loader: Arc<dyn AppLoader>,
    spawner: Arc<dyn WorkerSpawner>,
    assets: Arc<dyn AssetLoader>,
}

impl Launcher {
    pub fn new(
        config: LauncherConfig,
        status: Arc<dyn StatusReporter>,
        app_loader: Arc<dyn AppLoader>,
        spawner: Arc<dyn WorkerSpawner>,
        assets: Arc<dyn AssetLoader>,
    ) -> Self {
        Self {
            config,
            status,
            app_loader,
            spawner,
            assets,
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Bootstrap every subsystem and start the application.
    ///
    /// The application is initialised only if all three tasks succeed.
    pub async fn boot(&self) -> Result<Session> {
        let orchestrator = Orchestrator::new(
            Arc::clone(&self.status),
            MinimumDurationGate::new(self.config.min_splash),
        );

        let app_loader = Arc::clone(&self.app_loader);
        let spawner = Arc::clone(&self.spawner);
        let assets = Arc::clone(&self.assets);
        let LauncherConfig {
            core,
            worker,
            assets: assets_slot,
            ..
        } = self.config.clone();

        let tasks = vec![
            BootTask::new(core.slot, core.label, async move {
                app_loader.load().await.map(Subsystem::Core)
            }),
            BootTask::new(worker.slot, worker.label, async move {
                WorkerHandshake::new(spawner)
                    .handshake()
                    .await
                    .map(Subsystem::Worker)
                    .map_err(AppError::from)
            }),
            BootTask::new(assets_slot.slot, assets_slot.label, async move {
                assets.load().await.map(Subsystem::Assets)
            }),
        ];

        let (core, worker, assets) = unpack(orchestrator.bootstrap(tasks).await?)?;

        let app = core.init();
        let session = Session {
            id: Uuid::new_v4(),
            assets,
            bridge: Bridge::new(worker, app.sink),
            submissions: app.submissions,
        };
        info!(
            session_id = %session.id,
            assets = session.assets.len(),
            "Application initialised"
        );
        Ok(session)
    }
}

fn unpack(loaded: Vec<Subsystem>) -> Result<(Box<dyn AppCore>, ReadyWorker, AssetBundle)> {
    let mut core = None;
    let mut worker = None;
    let mut assets = None;

    for subsystem in loaded {
        let name = subsystem.name();
        let duplicate = match subsystem {
            Subsystem::Core(c) => core.replace(c).is_some(),
            Subsystem::Worker(w) => worker.replace(w).is_some(),
            Subsystem::Assets(a) => assets.replace(a).is_some(),
        };
        if duplicate {
            return Err(AppError::Internal(format!("duplicate {} subsystem", name)));
        }
    }

    match (core, worker, assets) {
        (Some(core), Some(worker), Some(assets)) => Ok((core, worker, assets)),
        _ => Err(AppError::Internal("missing bootstrap subsystem".to_string())),
    }
}

/// A warm application wired to its worker
pub struct Session {
    id: Uuid,
    assets: AssetBundle,
    bridge: Bridge,
    submissions: mpsc::Receiver<ByteStream>,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn assets(&self) -> &AssetBundle {
        &self.assets
    }

    /// Relay file submissions and worker results until shutdown or until
    /// the application stops submitting.
    pub async fn run(self, shutdown: ShutdownToken) -> SessionOutcome {
        info!(session_id = %self.id, "Session running");
        match self.bridge.run(self.submissions, shutdown).await {
            BridgeState::Live => SessionOutcome::Completed,
            BridgeState::Degraded(reason) => SessionOutcome::Degraded(reason),
        }
    }
}
