use serde::{Deserialize, Serialize};

/// Commodity codes reported by the intermediate commodity read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommodityCode {
    /// Electricity consumed; `rate` is instantaneous watts.
    ElectricityConsumed,
    ElectricityProduced,
    NaturalGasCubicFeet,
    NaturalGasCubicMeters,
    WaterGallons,
    WaterLiters,
    /// Total energy storage/take capacity in watt-hours.
    TotalEnergyStorageCapacity,
    /// Present energy storage/take capacity in watt-hours.
    PresentEnergyStorageCapacity,
    Other(u8),
}

impl CommodityCode {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => CommodityCode::ElectricityConsumed,
            1 => CommodityCode::ElectricityProduced,
            2 => CommodityCode::NaturalGasCubicFeet,
            3 => CommodityCode::NaturalGasCubicMeters,
            4 => CommodityCode::WaterGallons,
            5 => CommodityCode::WaterLiters,
            6 => CommodityCode::TotalEnergyStorageCapacity,
            7 => CommodityCode::PresentEnergyStorageCapacity,
            other => CommodityCode::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            CommodityCode::ElectricityConsumed => 0,
            CommodityCode::ElectricityProduced => 1,
            CommodityCode::NaturalGasCubicFeet => 2,
            CommodityCode::NaturalGasCubicMeters => 3,
            CommodityCode::WaterGallons => 4,
            CommodityCode::WaterLiters => 5,
            CommodityCode::TotalEnergyStorageCapacity => 6,
            CommodityCode::PresentEnergyStorageCapacity => 7,
            CommodityCode::Other(code) => code,
        }
    }
}

/// One coded `(rate, cumulative)` tuple from the module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CommodityReading {
    pub code: CommodityCode,
    pub rate: f64,
    pub cumulative: f64,
}

impl CommodityReading {
    pub fn new(code: u8, rate: f64, cumulative: f64) -> Self {
        Self {
            code: CommodityCode::from_code(code),
            rate,
            cumulative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_are_preserved() {
        let reading = CommodityReading::new(42, 1.0, 2.0);
        assert_eq!(reading.code, CommodityCode::Other(42));
        assert_eq!(reading.code.code(), 42);
    }

    #[test]
    fn energy_codes_map_to_storage_capacity() {
        assert_eq!(
            CommodityCode::from_code(6),
            CommodityCode::TotalEnergyStorageCapacity
        );
        assert_eq!(
            CommodityCode::from_code(7),
            CommodityCode::PresentEnergyStorageCapacity
        );
    }
}
