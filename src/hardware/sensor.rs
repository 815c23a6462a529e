use std::sync::Arc;

use super::simulated::SimulatedUcm;

/// Source of the RMS current drawn by the load.
#[cfg_attr(test, mockall::automock)]
pub trait CurrentSensor: Send + Sync {
    /// Current in amps.
    fn read_current(&self) -> f64;
}

/// Current transducer on an ADC channel, backed by the simulated heater.
pub struct SimulatedCurrentTransducer {
    channel: u8,
    ucm: Arc<SimulatedUcm>,
    line_voltage: f64,
}

impl SimulatedCurrentTransducer {
    pub fn new(channel: u8, ucm: Arc<SimulatedUcm>, line_voltage: f64) -> Self {
        Self {
            channel,
            ucm,
            line_voltage,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl CurrentSensor for SimulatedCurrentTransducer {
    fn read_current(&self) -> f64 {
        self.ucm.element_power_w() / self.line_voltage.max(1.0)
    }
}
