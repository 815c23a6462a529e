//! Simulated CEA-2045 module attached to a resistive water heater.
//!
//! The tank is modelled as an energy store: the element adds rated power while
//! on, standby losses drain it continuously, and a thermostat with hysteresis
//! decides when the element runs. DR commands shift the thermostat band.

use parking_lot::Mutex;
use std::time::Instant;
use tracing::{debug, trace};

use super::port::{Completion, DeviceCommandPort};
use crate::domain::{
    BasicCommand, CommodityCode, CommodityReading, DeviceOpState, DeviceQuery, OutsideCommStatus,
    ResponseCode,
};

/// Usable tank capacity (Wh) for a 50 gallon heater.
const DEFAULT_CAPACITY_WH: f64 = 3_600.0;
/// Normal thermostat band as a fraction of capacity.
const NORMAL_ON_BELOW: f64 = 0.85;
const NORMAL_OFF_ABOVE: f64 = 0.95;
/// Comfort override while curtailed.
const SHED_ON_BELOW: f64 = 0.30;
const EMERGENCY_ON_BELOW: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrMode {
    Normal,
    Shed,
    LoadUp,
    CriticalPeak,
    GridEmergency,
}

#[derive(Debug)]
struct SimState {
    started: bool,
    connection: OutsideCommStatus,
    mode: DrMode,
    element_on: bool,
    stored_wh: f64,
    consumed_wh: f64,
    capacity_wh: f64,
    rated_power_w: f64,
    standby_loss_w: f64,
    op_state: DeviceOpState,
    readings: Vec<CommodityReading>,
    last_update: Instant,
}

impl SimState {
    fn advance(&mut self, now: Instant) {
        let dt_h = now.saturating_duration_since(self.last_update).as_secs_f64() / 3600.0;
        self.last_update = now;

        if self.element_on {
            let added = self.rated_power_w * dt_h;
            self.stored_wh += added;
            self.consumed_wh += added;
        }
        self.stored_wh = (self.stored_wh - self.standby_loss_w * dt_h).clamp(0.0, self.capacity_wh);
        self.run_thermostat();
    }

    fn run_thermostat(&mut self) {
        let fill = self.stored_wh / self.capacity_wh;
        let (on_below, off_above) = match self.mode {
            DrMode::Normal => (NORMAL_ON_BELOW, NORMAL_OFF_ABOVE),
            DrMode::LoadUp => (1.0, 1.0),
            DrMode::Shed => (SHED_ON_BELOW, NORMAL_ON_BELOW),
            DrMode::CriticalPeak | DrMode::GridEmergency => (EMERGENCY_ON_BELOW, SHED_ON_BELOW),
        };

        if self.element_on && fill >= off_above {
            self.element_on = false;
        } else if !self.element_on && fill < on_below {
            self.element_on = true;
        }

        self.op_state = match (self.mode, self.element_on) {
            (DrMode::Normal, true) => DeviceOpState::RunningNormal,
            (DrMode::Normal, false) => DeviceOpState::IdleNormal,
            (DrMode::LoadUp, true) => DeviceOpState::RunningHeightenedGrid,
            (DrMode::LoadUp, false) => DeviceOpState::IdleHeightened,
            (_, true) => DeviceOpState::RunningCurtailedGrid,
            (_, false) => DeviceOpState::IdleGrid,
        };
    }

    fn element_power_w(&self) -> f64 {
        if self.element_on {
            self.rated_power_w
        } else {
            0.0
        }
    }

    fn capture_commodities(&mut self) {
        self.readings = vec![
            CommodityReading {
                code: CommodityCode::ElectricityConsumed,
                rate: self.element_power_w(),
                cumulative: self.consumed_wh,
            },
            CommodityReading {
                code: CommodityCode::TotalEnergyStorageCapacity,
                rate: 0.0,
                cumulative: self.capacity_wh,
            },
            CommodityReading {
                code: CommodityCode::PresentEnergyStorageCapacity,
                rate: 0.0,
                cumulative: self.capacity_wh - self.stored_wh,
            },
        ];
    }
}

/// In-process stand-in for the communication module and its heater.
#[derive(Debug)]
pub struct SimulatedUcm {
    state: Mutex<SimState>,
}

impl SimulatedUcm {
    pub fn new(rated_power_w: f64, standby_loss_w: f64) -> Self {
        Self::with_capacity(rated_power_w, standby_loss_w, DEFAULT_CAPACITY_WH, 0.5)
    }

    /// Heater with an explicit tank capacity and initial fill fraction.
    pub fn with_capacity(
        rated_power_w: f64,
        standby_loss_w: f64,
        capacity_wh: f64,
        initial_fill: f64,
    ) -> Self {
        let capacity_wh = capacity_wh.max(1.0);
        let mut state = SimState {
            started: false,
            connection: OutsideCommStatus::NotFound,
            mode: DrMode::Normal,
            element_on: false,
            stored_wh: capacity_wh * initial_fill.clamp(0.0, 1.0),
            consumed_wh: 0.0,
            capacity_wh,
            rated_power_w,
            standby_loss_w,
            op_state: DeviceOpState::IdleNormal,
            readings: Vec::new(),
            last_update: Instant::now(),
        };
        state.run_thermostat();
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn element_power_w(&self) -> f64 {
        let mut st = self.state.lock();
        st.advance(Instant::now());
        st.element_power_w()
    }

    pub fn connection_status(&self) -> OutsideCommStatus {
        self.state.lock().connection
    }
}

impl DeviceCommandPort for SimulatedUcm {
    fn start(&self) {
        self.state.lock().started = true;
        debug!("simulated UCM started");
    }

    fn issue(&self, command: BasicCommand, duration_s: u32) -> Completion {
        let mut st = self.state.lock();
        if !st.started {
            return Completion::ready(ResponseCode::Busy);
        }
        st.advance(Instant::now());
        st.mode = match command {
            BasicCommand::Shed => DrMode::Shed,
            BasicCommand::EndShed => DrMode::Normal,
            BasicCommand::LoadUp => DrMode::LoadUp,
            BasicCommand::CriticalPeakEvent => DrMode::CriticalPeak,
            BasicCommand::GridEmergency => DrMode::GridEmergency,
        };
        // a new event re-evaluates the element against the new band
        st.element_on = false;
        st.run_thermostat();
        trace!(%command, duration_s, op_state = %st.op_state, "simulated command applied");
        Completion::ready(ResponseCode::Success)
    }

    fn query(&self, query: DeviceQuery) -> Completion {
        let mut st = self.state.lock();
        if !st.started {
            return Completion::ready(ResponseCode::Busy);
        }
        match query {
            DeviceQuery::Commodity => {
                st.advance(Instant::now());
                st.capture_commodities();
            }
            DeviceQuery::OperationalState => st.advance(Instant::now()),
            DeviceQuery::SupportedDataLinkMessages
            | DeviceQuery::MaxPayload
            | DeviceQuery::SupportedIntermediateMessages
            | DeviceQuery::DeviceInformation => {}
        }
        Completion::ready(ResponseCode::Success)
    }

    fn announce_connection_status(&self, status: OutsideCommStatus) {
        self.state.lock().connection = status;
    }

    fn operational_state(&self) -> DeviceOpState {
        self.state.lock().op_state
    }

    fn commodity_readings(&self) -> Vec<CommodityReading> {
        self.state.lock().readings.clone()
    }
}
