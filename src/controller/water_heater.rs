//! Electric water heater controller: startup handshake, DR event handlers and
//! the reconciliation loop that keeps the DR setpoint and the device in step.

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use super::{
    arbitration::{arbitrate, Correction},
    cadence::Cadence,
    clock::Clock,
    error::ControllerError,
};
use crate::config::Config;
use crate::domain::{
    BasicCommand, DerStatus, DeviceOpState, DeviceQuery, DistributedEnergyResource,
    OperationalState, OutsideCommStatus, PowerState, PropertyStore, INDEFINITE,
};
use crate::hardware::{CurrentSensor, DeviceCommandPort, Transport};
use crate::telemetry::{TelemetryRecord, TelemetrySink};

/// Capability queries issued once at startup, each awaited before the next.
pub const HANDSHAKE: [DeviceQuery; 4] = [
    DeviceQuery::SupportedDataLinkMessages,
    DeviceQuery::MaxPayload,
    DeviceQuery::SupportedIntermediateMessages,
    DeviceQuery::DeviceInformation,
];

/// Static DER properties and loop timing.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub rated_import_power: f64,
    pub import_ramp: f64,
    pub idle_losses: f64,
    pub line_voltage: f64,
    pub refresh_interval: Duration,
    pub heartbeat_interval: Duration,
    pub log_increment_minutes: u32,
}

impl ControllerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            rated_import_power: cfg.water_heater.rated_import_power,
            import_ramp: cfg.water_heater.rated_import_ramp,
            idle_losses: cfg.water_heater.idle_losses,
            line_voltage: cfg.controller.line_voltage,
            refresh_interval: cfg.controller.refresh_interval(),
            heartbeat_interval: Duration::from_secs(u64::from(cfg.ucm.heartbeat_minutes) * 60),
            log_increment_minutes: cfg.logging.increment_minutes,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            rated_import_power: 4_500.0,
            import_ramp: 4_500.0,
            idle_losses: 100.0,
            line_voltage: 240.0,
            refresh_interval: Duration::from_millis(500),
            heartbeat_interval: Duration::from_secs(300),
            log_increment_minutes: 1,
        }
    }
}

/// Everything the controller talks to besides the transport.
pub struct Collaborators {
    pub device: Arc<dyn DeviceCommandPort>,
    pub sensor: Arc<dyn CurrentSensor>,
    pub sink: Box<dyn TelemetrySink>,
    pub clock: Arc<dyn Clock>,
}

struct Inner {
    device: Arc<dyn DeviceCommandPort>,
    sensor: Arc<dyn CurrentSensor>,
    sink: Box<dyn TelemetrySink>,
    properties: PropertyStore,
    /// What we last told the device; never read by arbitration.
    local_state: OperationalState,
    cadence: Cadence,
    line_voltage: f64,
}

impl Inner {
    fn send(&self, command: BasicCommand) {
        self.device
            .issue(command, INDEFINITE)
            .detach(command.to_string());
    }

    fn query_properties(&mut self) {
        self.device
            .query(DeviceQuery::Commodity)
            .detach(DeviceQuery::Commodity.to_string());
        let readings = self.device.commodity_readings();
        self.properties.apply_commodities(readings);

        // the reported state is read lazily through the port
        self.device
            .query(DeviceQuery::OperationalState)
            .detach(DeviceQuery::OperationalState.to_string());
    }

    /// Whole watts, never negative.
    fn real_import_power(&self) -> f64 {
        (self.sensor.read_current() * self.line_voltage).max(0.0).trunc()
    }

    fn record(&self) -> TelemetryRecord {
        TelemetryRecord::new(
            &self.properties.snapshot(),
            self.real_import_power(),
            self.device.operational_state(),
        )
    }

    fn log(&mut self, at: NaiveDateTime) {
        let record = self.record();
        match self.sink.append(at, &record) {
            Ok(()) => debug!(%record, "telemetry record written"),
            Err(e) => warn!(error = %e, "failed to append telemetry record"),
        }
    }

    fn export_power(&mut self) {
        // a water heater cannot export
        self.properties.set_export_energy(0.0);
    }

    fn arbitrate(&self) {
        let import_watts = self.properties.import_watts();
        let import_power = self.properties.import_power();
        let device_state = self.device.operational_state();

        match arbitrate(import_watts, import_power, device_state) {
            Some(Correction::ResumeImport) => {
                debug!(import_watts, %device_state, "device idle against import setpoint, resuming import");
                self.send(BasicCommand::LoadUp);
            }
            Some(Correction::IdleLoss) => {
                debug!(import_power, %device_state, "device drawing power with zero setpoint, shedding");
                self.send(BasicCommand::Shed);
            }
            None => {}
        }
    }

    fn status(&self) -> DerStatus {
        DerStatus {
            rated_import_energy_wh: self.properties.rated_import_energy(),
            device_operational_state: self.device.operational_state(),
            local_operational_state: self.local_state,
            import_control_w: self.properties.import_watts(),
            import_power_w: self.properties.import_power(),
            real_import_power_w: self.real_import_power(),
            import_energy_wh: self.properties.import_energy(),
        }
    }
}

/// Demand-response controller for one electric water heater.
///
/// All mutation goes through the DR handlers, the setpoint setters and
/// [`tick`](Self::tick); each holds the controller lock for its whole call.
pub struct ElectricWaterHeater {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    transport: Box<dyn Transport>,
}

impl ElectricWaterHeater {
    /// Open the link, run the capability handshake and seed DER properties.
    ///
    /// A transport that fails to open is fatal; the caller is expected to
    /// terminate the process.
    pub async fn start(
        mut transport: Box<dyn Transport>,
        parts: Collaborators,
        settings: ControllerSettings,
    ) -> Result<Self, ControllerError> {
        transport
            .open()
            .await
            .map_err(|source| ControllerError::TransportUnavailable {
                transport: transport.describe(),
                source,
            })?;
        info!(transport = %transport.describe(), "transport open");

        let Collaborators {
            device,
            sensor,
            sink,
            clock,
        } = parts;

        device.start();
        device.announce_connection_status(OutsideCommStatus::Found);

        // the module buffers a single outstanding command
        for query in HANDSHAKE {
            let code = device
                .query(query)
                .wait()
                .await
                .map_err(|source| ControllerError::Handshake { query, source })?;
            if code.is_success() {
                debug!(%query, "handshake query acknowledged");
            } else {
                warn!(%query, response = %code, "handshake query not acknowledged");
            }
        }

        let mut properties = PropertyStore::new();
        properties.set_rated_import_power(settings.rated_import_power);
        properties.set_export_energy(0.0);
        properties.set_import_ramp(settings.import_ramp);
        properties.set_idle_losses(settings.idle_losses);

        let mut inner = Inner {
            device,
            sensor,
            sink,
            properties,
            local_state: OperationalState::Normal,
            cadence: Cadence::new(
                settings.refresh_interval,
                settings.heartbeat_interval,
                settings.log_increment_minutes,
            ),
            line_voltage: settings.line_voltage,
        };
        info!(
            rated_import_power = settings.rated_import_power,
            import_ramp = settings.import_ramp,
            idle_losses = settings.idle_losses,
            "startup complete"
        );
        inner.query_properties();

        Ok(Self {
            inner: Mutex::new(inner),
            clock,
            transport,
        })
    }

    pub fn transport(&self) -> String {
        self.transport.describe()
    }

    pub fn set_critical_peak(&self) {
        let mut inner = self.inner.lock();
        inner.send(BasicCommand::CriticalPeakEvent);
        inner.local_state = OperationalState::CriticalPeak;
        info!("Critical peak event command received");
    }

    pub fn set_load_up(&self) {
        let mut inner = self.inner.lock();
        inner.local_state = OperationalState::LoadUp;
        inner.send(BasicCommand::LoadUp);
        info!("Load up command received");
    }

    pub fn set_grid_emergency(&self) {
        let mut inner = self.inner.lock();
        inner.local_state = OperationalState::GridEmergency;
        inner.send(BasicCommand::GridEmergency);
        info!("Grid emergency command received");
    }

    /// End any shed posture. Local state is left as is.
    pub fn end_curtailment(&self) {
        let inner = self.inner.lock();
        inner.send(BasicCommand::EndShed);
        info!(local_state = %inner.local_state, "Ending previous curtailment");
    }

    /// Refresh cached properties from the module's commodity data.
    pub fn query_properties(&self) {
        self.inner.lock().query_properties();
    }

    /// One pass of the reconciliation loop. Never fails; sub-operation errors
    /// are logged.
    pub fn tick(&self, elapsed: Duration) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let due = inner.cadence.advance(elapsed, now);

        if due.refresh {
            inner.query_properties();
        }
        if due.heartbeat {
            inner
                .device
                .announce_connection_status(OutsideCommStatus::Found);
            debug!("heartbeat sent");
        }
        if due.log {
            inner.log(now);
        }
        inner.arbitrate();
    }

    /// Run [`tick`](Self::tick) on a fixed period until the task is dropped.
    pub async fn run(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last = tokio::time::Instant::now();
        loop {
            interval.tick().await;
            let now = tokio::time::Instant::now();
            self.tick(now.duration_since(last));
            last = now;
        }
    }

    /// Import power the DR layer wants (W).
    pub fn set_import_watts(&self, watts: f64) {
        self.inner.lock().properties.set_import_watts(watts);
    }

    /// Export setpoint; recorded, but the heater never exports.
    pub fn set_export_watts(&self, watts: f64) {
        let mut inner = self.inner.lock();
        inner.properties.set_export_watts(watts);
        inner.export_power();
    }

    pub fn local_operational_state(&self) -> OperationalState {
        self.inner.lock().local_state
    }

    pub fn device_operational_state(&self) -> DeviceOpState {
        self.inner.lock().device.operational_state()
    }

    pub fn power_state(&self) -> PowerState {
        self.inner.lock().properties.snapshot()
    }

    /// Real import power from the current transducer at nominal line voltage.
    pub fn real_import_power(&self) -> f64 {
        self.inner.lock().real_import_power()
    }
}

impl DistributedEnergyResource for ElectricWaterHeater {
    fn import_power(&self) {
        self.inner.lock().send(BasicCommand::LoadUp);
    }

    fn export_power(&self) {
        self.inner.lock().export_power();
    }

    fn idle_loss(&self) {
        self.inner.lock().send(BasicCommand::Shed);
    }

    fn log(&self) {
        let now = self.clock.now();
        self.inner.lock().log(now);
    }

    fn display(&self) -> DerStatus {
        let status = self.inner.lock().status();
        debug!("\n{}", status);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::clock::ManualClock;
    use crate::domain::{CommodityReading, ResponseCode};
    use crate::hardware::{sensor::MockCurrentSensor, Completion, LoopbackTransport};
    use crate::telemetry::MemorySink;
    use chrono::NaiveDate;

    /// Port that answers everything with success and reports fixed values.
    #[derive(Default)]
    struct FixedPort {
        state: parking_lot::Mutex<DeviceOpState>,
        readings: parking_lot::Mutex<Vec<CommodityReading>>,
        issued: parking_lot::Mutex<Vec<BasicCommand>>,
    }

    impl DeviceCommandPort for FixedPort {
        fn start(&self) {}
        fn issue(&self, command: BasicCommand, _duration_s: u32) -> Completion {
            self.issued.lock().push(command);
            Completion::ready(ResponseCode::Success)
        }
        fn query(&self, _query: DeviceQuery) -> Completion {
            Completion::ready(ResponseCode::Success)
        }
        fn announce_connection_status(&self, _status: OutsideCommStatus) {}
        fn operational_state(&self) -> DeviceOpState {
            *self.state.lock()
        }
        fn commodity_readings(&self) -> Vec<CommodityReading> {
            self.readings.lock().clone()
        }
    }

    async fn controller(port: Arc<FixedPort>, amps: f64) -> ElectricWaterHeater {
        let mut sensor = MockCurrentSensor::new();
        sensor.expect_read_current().return_const(amps);
        let clock = ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 15)
                .unwrap()
                .and_hms_opt(8, 0, 30)
                .unwrap(),
        );
        ElectricWaterHeater::start(
            Box::new(LoopbackTransport::new()),
            Collaborators {
                device: port,
                sensor: Arc::new(sensor),
                sink: Box::new(MemorySink::new()),
                clock: Arc::new(clock),
            },
            ControllerSettings::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn startup_seeds_static_properties() {
        let port = Arc::new(FixedPort::default());
        *port.readings.lock() = vec![CommodityReading::new(6, 0.0, 3_600.0)];
        let ewh = controller(port, 0.0).await;

        let power = ewh.power_state();
        assert_eq!(power.rated_import_power, 4_500.0);
        assert_eq!(power.import_ramp, 4_500.0);
        assert_eq!(power.idle_losses, 100.0);
        assert_eq!(power.export_energy, 0.0);
        assert_eq!(power.rated_import_energy, 3_600.0);
        assert_eq!(ewh.transport(), "loopback");
    }

    #[tokio::test]
    async fn real_import_power_uses_line_voltage() {
        let ewh = controller(Arc::new(FixedPort::default()), 18.75).await;
        assert_eq!(ewh.real_import_power(), 4_500.0);
    }

    #[tokio::test]
    async fn real_import_power_truncates_to_whole_watts() {
        let ewh = controller(Arc::new(FixedPort::default()), 2.1).await;
        assert_eq!(ewh.real_import_power(), 504.0);
    }

    #[tokio::test]
    async fn end_curtailment_keeps_local_state() {
        let port = Arc::new(FixedPort::default());
        let ewh = controller(port.clone(), 0.0).await;

        ewh.set_critical_peak();
        ewh.end_curtailment();

        assert_eq!(ewh.local_operational_state(), OperationalState::CriticalPeak);
        assert_eq!(
            *port.issued.lock(),
            vec![BasicCommand::CriticalPeakEvent, BasicCommand::EndShed]
        );
    }

    #[tokio::test]
    async fn export_setpoint_never_produces_export_energy() {
        let ewh = controller(Arc::new(FixedPort::default()), 0.0).await;
        ewh.set_export_watts(2_000.0);
        ewh.export_power();

        let power = ewh.power_state();
        assert_eq!(power.export_watts, 2_000.0);
        assert_eq!(power.export_energy, 0.0);
    }

    #[tokio::test]
    async fn display_reports_both_states() {
        let port = Arc::new(FixedPort::default());
        *port.state.lock() = DeviceOpState::IdleGrid;
        let ewh = controller(port, 0.0).await;
        ewh.set_load_up();

        let status = ewh.display();
        assert_eq!(status.local_operational_state, OperationalState::LoadUp);
        assert_eq!(status.device_operational_state, DeviceOpState::IdleGrid);
    }
}
