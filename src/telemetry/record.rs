use serde::Serialize;
use std::fmt;

use crate::domain::{DeviceOpState, PowerState};

/// One row of the DER telemetry log.
///
/// Field order is a persisted contract consumed by downstream tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub export_watts: f64,
    pub export_power: f64,
    pub export_energy: f64,
    pub import_watts: f64,
    pub import_power: f64,
    pub import_energy: f64,
    pub rated_import_energy: f64,
    pub real_import_power: f64,
    pub op_state: u8,
}

impl TelemetryRecord {
    pub const FIELDS: [&'static str; 9] = [
        "export_watts",
        "export_power",
        "export_energy",
        "import_watts",
        "import_power",
        "import_energy",
        "rated_import_energy",
        "real_import_power",
        "op_state",
    ];

    pub fn new(power: &PowerState, real_import_power: f64, op_state: DeviceOpState) -> Self {
        Self {
            export_watts: power.export_watts,
            export_power: power.export_power,
            export_energy: power.export_energy,
            import_watts: power.import_watts,
            import_power: power.import_power,
            import_energy: power.import_energy,
            rated_import_energy: power.rated_import_energy,
            real_import_power,
            op_state: op_state.code(),
        }
    }
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.export_watts,
            self.export_power,
            self.export_energy,
            self.import_watts,
            self.import_power,
            self.import_energy,
            self.rated_import_energy,
            self.real_import_power,
            self.op_state
        )
    }
}
