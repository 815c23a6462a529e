#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use ewh_dr_controller::controller::{
    Collaborators, ControllerError, ControllerSettings, ElectricWaterHeater, ManualClock,
};
use ewh_dr_controller::domain::{
    BasicCommand, CommodityReading, DeviceOpState, DeviceQuery, OutsideCommStatus, ResponseCode,
};
use ewh_dr_controller::hardware::{
    Completion, CurrentSensor, DeviceCommandPort, LoopbackTransport, Transport,
};
use ewh_dr_controller::telemetry::MemorySink;

#[derive(Debug, Clone, PartialEq)]
pub enum PortEvent {
    Start,
    Announce(OutsideCommStatus),
    Issue(BasicCommand, u32),
    Query(DeviceQuery),
    /// A query was submitted while an earlier one was still unanswered.
    Overlap(DeviceQuery),
}

/// Port that records every call and answers queries from a spawned task, so
/// awaiting callers actually yield before the completion resolves.
#[derive(Default)]
pub struct RecordingPort {
    events: Mutex<Vec<PortEvent>>,
    state: Mutex<DeviceOpState>,
    readings: Mutex<Vec<CommodityReading>>,
    handshake_code: Mutex<Option<ResponseCode>>,
    issue_code: Mutex<Option<ResponseCode>>,
    drop_queries: AtomicBool,
    outstanding: Arc<AtomicBool>,
}

impl RecordingPort {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_state(&self, state: DeviceOpState) {
        *self.state.lock() = state;
    }

    pub fn set_readings(&self, readings: Vec<CommodityReading>) {
        *self.readings.lock() = readings;
    }

    /// Answer every query with `code` instead of success.
    pub fn answer_queries_with(&self, code: ResponseCode) {
        *self.handshake_code.lock() = Some(code);
    }

    /// Answer every basic command with `code` instead of success.
    pub fn answer_commands_with(&self, code: ResponseCode) {
        *self.issue_code.lock() = Some(code);
    }

    /// Drop completers so awaiting callers see the engine disappear.
    pub fn drop_query_completions(&self) {
        self.drop_queries.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<PortEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn issued(&self) -> Vec<BasicCommand> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PortEvent::Issue(command, _) => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn queries(&self) -> Vec<DeviceQuery> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PortEvent::Query(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    pub fn announcements(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PortEvent::Announce(OutsideCommStatus::Found)))
            .count()
    }
}

impl DeviceCommandPort for RecordingPort {
    fn start(&self) {
        self.events.lock().push(PortEvent::Start);
    }

    fn issue(&self, command: BasicCommand, duration_s: u32) -> Completion {
        self.events.lock().push(PortEvent::Issue(command, duration_s));
        Completion::ready(self.issue_code.lock().unwrap_or(ResponseCode::Success))
    }

    fn query(&self, query: DeviceQuery) -> Completion {
        {
            let mut events = self.events.lock();
            if self.outstanding.swap(true, Ordering::SeqCst) {
                events.push(PortEvent::Overlap(query));
            }
            events.push(PortEvent::Query(query));
        }

        let (completer, completion) = Completion::pending();
        let outstanding = self.outstanding.clone();
        if self.drop_queries.load(Ordering::SeqCst) {
            outstanding.store(false, Ordering::SeqCst);
            drop(completer);
            return completion;
        }

        let code = self.handshake_code.lock().unwrap_or(ResponseCode::Success);
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            outstanding.store(false, Ordering::SeqCst);
            completer.complete(code);
        });
        completion
    }

    fn announce_connection_status(&self, status: OutsideCommStatus) {
        self.events.lock().push(PortEvent::Announce(status));
    }

    fn operational_state(&self) -> DeviceOpState {
        *self.state.lock()
    }

    fn commodity_readings(&self) -> Vec<CommodityReading> {
        self.readings.lock().clone()
    }
}

pub struct FixedSensor(pub f64);

impl CurrentSensor for FixedSensor {
    fn read_current(&self) -> f64 {
        self.0
    }
}

/// Transport whose open fails the way a missing tty does.
pub struct MissingTty;

#[async_trait]
impl Transport for MissingTty {
    async fn open(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            "No such file or directory",
        ))
    }

    fn describe(&self) -> String {
        "/dev/ttyUSB9".to_string()
    }
}

pub fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 15)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

pub struct Harness {
    pub ewh: ElectricWaterHeater,
    pub port: Arc<RecordingPort>,
    pub sink: MemorySink,
    pub clock: Arc<ManualClock>,
}

pub async fn try_start(
    transport: Box<dyn Transport>,
    port: Arc<RecordingPort>,
    amps: f64,
    start: NaiveDateTime,
) -> Result<Harness, ControllerError> {
    let sink = MemorySink::new();
    let clock = Arc::new(ManualClock::new(start));
    let ewh = ElectricWaterHeater::start(
        transport,
        Collaborators {
            device: port.clone(),
            sensor: Arc::new(FixedSensor(amps)),
            sink: Box::new(sink.clone()),
            clock: clock.clone(),
        },
        ControllerSettings::default(),
    )
    .await?;
    Ok(Harness {
        ewh,
        port,
        sink,
        clock,
    })
}

pub async fn start(port: Arc<RecordingPort>) -> Harness {
    try_start(Box::new(LoopbackTransport::new()), port, 0.0, at(8, 0, 30))
        .await
        .unwrap()
}
