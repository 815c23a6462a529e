use serde::{Deserialize, Serialize};

use super::commodity::{CommodityCode, CommodityReading};

/// Snapshot of the DER power/energy properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PowerState {
    /// Import control requested by the DR layer (W).
    pub import_watts: f64,
    /// Import power reported by the device (W).
    pub import_power: f64,
    pub import_energy: f64,
    pub import_ramp: f64,
    pub rated_import_power: f64,
    pub rated_import_energy: f64,
    pub export_watts: f64,
    pub export_power: f64,
    pub export_energy: f64,
    pub idle_losses: f64,
}

/// Property store backing a distributed energy resource.
///
/// The controller never caches these values; every read goes through here.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    state: PowerState,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PowerState {
        self.state.clone()
    }

    pub fn import_watts(&self) -> f64 {
        self.state.import_watts
    }
    pub fn set_import_watts(&mut self, watts: f64) {
        self.state.import_watts = watts;
    }

    pub fn import_power(&self) -> f64 {
        self.state.import_power
    }
    pub fn set_import_power(&mut self, watts: f64) {
        self.state.import_power = watts;
    }

    pub fn import_energy(&self) -> f64 {
        self.state.import_energy
    }
    pub fn set_import_energy(&mut self, watt_hours: f64) {
        self.state.import_energy = watt_hours;
    }

    pub fn import_ramp(&self) -> f64 {
        self.state.import_ramp
    }
    pub fn set_import_ramp(&mut self, watts_per_second: f64) {
        self.state.import_ramp = watts_per_second;
    }

    pub fn rated_import_power(&self) -> f64 {
        self.state.rated_import_power
    }
    pub fn set_rated_import_power(&mut self, watts: f64) {
        self.state.rated_import_power = watts;
    }

    pub fn rated_import_energy(&self) -> f64 {
        self.state.rated_import_energy
    }
    pub fn set_rated_import_energy(&mut self, watt_hours: f64) {
        self.state.rated_import_energy = watt_hours;
    }

    pub fn export_watts(&self) -> f64 {
        self.state.export_watts
    }
    pub fn set_export_watts(&mut self, watts: f64) {
        self.state.export_watts = watts;
    }

    pub fn export_power(&self) -> f64 {
        self.state.export_power
    }
    pub fn set_export_power(&mut self, watts: f64) {
        self.state.export_power = watts;
    }

    pub fn export_energy(&self) -> f64 {
        self.state.export_energy
    }
    pub fn set_export_energy(&mut self, watt_hours: f64) {
        self.state.export_energy = watt_hours;
    }

    pub fn idle_losses(&self) -> f64 {
        self.state.idle_losses
    }
    pub fn set_idle_losses(&mut self, watts: f64) {
        self.state.idle_losses = watts;
    }

    /// Fold a commodity read into the store.
    ///
    /// Electricity consumed feeds the device-reported import power; the two
    /// storage capacity codes feed rated and present import energy. Every other
    /// code is ignored.
    pub fn apply_commodities<I>(&mut self, readings: I)
    where
        I: IntoIterator<Item = CommodityReading>,
    {
        for reading in readings {
            match reading.code {
                CommodityCode::ElectricityConsumed => self.set_import_power(reading.rate),
                CommodityCode::TotalEnergyStorageCapacity => {
                    self.set_rated_import_energy(reading.cumulative)
                }
                CommodityCode::PresentEnergyStorageCapacity => {
                    self.set_import_energy(reading.cumulative)
                }
                _ => {}
            }
        }
    }
}
