pub mod arbitration;
pub mod cadence;
pub mod clock;
pub mod error;
pub mod water_heater;

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::hardware::DeviceFactory;
use crate::telemetry::FileSink;

pub use arbitration::{arbitrate, Correction};
pub use cadence::{Cadence, Due};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ControllerError;
pub use water_heater::{Collaborators, ControllerSettings, ElectricWaterHeater, HANDSHAKE};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub controller: Arc<ElectricWaterHeater>,
}

impl AppState {
    /// Build the device stack from config and run controller startup.
    pub async fn new(cfg: Config) -> Result<Self, ControllerError> {
        let sink = FileSink::open(&cfg.logging.path).map_err(ControllerError::Sink)?;
        info!(path = %sink.path().display(), "telemetry log open");

        let stack = DeviceFactory::new(cfg.transport.mode)
            .build(&cfg)
            .map_err(ControllerError::Hardware)?;
        let controller = ElectricWaterHeater::start(
            stack.transport,
            Collaborators {
                device: stack.device,
                sensor: stack.sensor,
                sink: Box::new(sink),
                clock: Arc::new(SystemClock),
            },
            ControllerSettings::from_config(&cfg),
        )
        .await?;

        Ok(Self {
            cfg,
            controller: Arc::new(controller),
        })
    }
}

pub fn spawn_controller_tasks(state: AppState, cfg: &Config) {
    let controller = state.controller.clone();
    let period = cfg.controller.tick();
    tokio::spawn(async move {
        controller.run(period).await;
        warn!("controller loop stopped");
    });
}
