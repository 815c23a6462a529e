use serde::{Deserialize, Serialize};

use super::types::{DeviceOpState, OperationalState};

/// Behaviour every controllable DER exposes to the DR layer.
///
/// The controller loop decides *when* to call these; implementations decide
/// what a given action means for their hardware.
pub trait DistributedEnergyResource: Send + Sync {
    /// Start or resume importing power.
    fn import_power(&self);
    /// Start exporting power, if the resource can.
    fn export_power(&self);
    /// Drop to idle losses only.
    fn idle_loss(&self);
    /// Append one telemetry record to the log sink.
    fn log(&self);
    /// Human-facing snapshot of the resource.
    fn display(&self) -> DerStatus;
}

/// Status snapshot served by the control surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerStatus {
    pub rated_import_energy_wh: f64,
    pub device_operational_state: DeviceOpState,
    pub local_operational_state: OperationalState,
    pub import_control_w: f64,
    pub import_power_w: f64,
    pub real_import_power_w: f64,
    pub import_energy_wh: f64,
}

impl std::fmt::Display for DerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Rated Import Energy:\t{}\twatt-hours", self.rated_import_energy_wh)?;
        writeln!(f, "Operational State:\t{}", self.device_operational_state.code())?;
        writeln!(f, "Import Control:\t\t{}\twatts", self.import_control_w)?;
        writeln!(f, "Import Power:\t\t{}\twatts", self.import_power_w)?;
        writeln!(f, "Real Import Power:\t{}\twatts", self.real_import_power_w)?;
        write!(f, "Import Energy:\t\t{}\twatt-hours", self.import_energy_wh)
    }
}
