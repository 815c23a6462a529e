use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{
    CurrentSensor, DeviceCommandPort, DeviceError, LoopbackTransport, SimulatedCurrentTransducer,
    SimulatedUcm, Transport,
};
use crate::config::Config;

/// Hardware mode configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareMode {
    /// Simulated module and heater over a loopback link
    Simulated,
    /// Module reached over the configured serial port
    Serial,
}

/// Collaborators the controller is built from.
pub struct DeviceStack {
    pub transport: Box<dyn Transport>,
    pub device: Arc<dyn DeviceCommandPort>,
    pub sensor: Arc<dyn CurrentSensor>,
}

/// Factory for creating the device stack
pub struct DeviceFactory {
    mode: HardwareMode,
    engine: Option<(Arc<dyn DeviceCommandPort>, Arc<dyn CurrentSensor>)>,
}

impl DeviceFactory {
    pub fn new(mode: HardwareMode) -> Self {
        Self { mode, engine: None }
    }

    /// Protocol engine and current sensor driving a real module in serial
    /// mode.
    pub fn with_engine(
        mut self,
        device: Arc<dyn DeviceCommandPort>,
        sensor: Arc<dyn CurrentSensor>,
    ) -> Self {
        self.engine = Some((device, sensor));
        self
    }

    /// Serial mode without an engine is refused; the simulator never stands
    /// in for a real heater.
    pub fn build(self, cfg: &Config) -> Result<DeviceStack, DeviceError> {
        match self.mode {
            HardwareMode::Simulated => Ok(Self::simulated(cfg)),
            HardwareMode::Serial => {
                let (device, sensor) =
                    self.engine.ok_or_else(|| DeviceError::NoProtocolEngine {
                        port: cfg.transport.serial_port.clone(),
                    })?;
                Ok(DeviceStack {
                    transport: Self::serial_transport(cfg),
                    device,
                    sensor,
                })
            }
        }
    }

    fn simulated(cfg: &Config) -> DeviceStack {
        let ucm = Arc::new(SimulatedUcm::new(
            cfg.water_heater.rated_import_power,
            cfg.water_heater.idle_losses,
        ));
        let sensor = Arc::new(SimulatedCurrentTransducer::new(
            cfg.sensor.mcp_channel,
            ucm.clone(),
            cfg.controller.line_voltage,
        ));
        DeviceStack {
            transport: Box::new(LoopbackTransport::new()),
            device: ucm,
            sensor,
        }
    }

    #[cfg(feature = "serial")]
    fn serial_transport(cfg: &Config) -> Box<dyn Transport> {
        Box::new(super::SerialTransport::new(
            cfg.transport.serial_port.clone(),
            cfg.transport.baud_rate,
        ))
    }

    #[cfg(not(feature = "serial"))]
    fn serial_transport(cfg: &Config) -> Box<dyn Transport> {
        Box::new(super::UnavailableTransport::new(
            cfg.transport.serial_port.clone(),
            "serial support not compiled in (enable the `serial` feature)",
        ))
    }
}

impl Default for DeviceFactory {
    fn default() -> Self {
        Self::new(HardwareMode::Simulated)
    }
}
