//! Device command port: the seam between the controller and the
//! communication module's protocol engine.
//!
//! Commands and queries are submitted synchronously and hand back a one-shot
//! [`Completion`]. Callers either await it (startup handshake) or
//! [`Completion::detach`] it (steady-state fire-and-forget commands).

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::{
    BasicCommand, CommodityReading, DeviceOpState, DeviceQuery, OutsideCommStatus, ResponseCode,
};

/// Device port errors
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("completion dropped before the module answered")]
    CompletionDropped,
    #[error("module rejected {what}: {code}")]
    Rejected { what: String, code: ResponseCode },
    #[error("no CEA-2045 protocol engine supplied for serial port {port}")]
    NoProtocolEngine { port: String },
}

/// Pending result of a command or query submitted to the module.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<ResponseCode>,
}

/// Producer half of a [`Completion`], held by the protocol engine.
#[derive(Debug)]
pub struct Completer {
    tx: oneshot::Sender<ResponseCode>,
}

impl Completer {
    pub fn complete(self, code: ResponseCode) {
        // receiver gone means the caller detached without a runtime
        let _ = self.tx.send(code);
    }
}

impl Completion {
    pub fn pending() -> (Completer, Completion) {
        let (tx, rx) = oneshot::channel();
        (Completer { tx }, Completion { rx })
    }

    /// Completion that has already resolved with `code`.
    pub fn ready(code: ResponseCode) -> Self {
        let (completer, completion) = Self::pending();
        completer.complete(code);
        completion
    }

    pub async fn wait(self) -> Result<ResponseCode, DeviceError> {
        self.rx.await.map_err(|_| DeviceError::CompletionDropped)
    }

    /// Await the response, treating any non-success code as an error.
    pub async fn expect_success(self, what: impl Into<String>) -> Result<(), DeviceError> {
        let code = self.wait().await?;
        if code.is_success() {
            Ok(())
        } else {
            Err(DeviceError::Rejected {
                what: what.into(),
                code,
            })
        }
    }

    /// Fire-and-forget: the outcome only reaches the log.
    pub fn detach(self, what: impl Into<String>) {
        let what = what.into();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match self.expect_success(what.clone()).await {
                        Ok(()) => debug!(command = %what, "module acknowledged"),
                        Err(e) => warn!(command = %what, error = %e, "command failed"),
                    }
                });
            }
            Err(_) => debug!(command = %what, "no runtime, completion discarded"),
        }
    }
}

/// Command/response port of the communication module.
///
/// Implementations own framing, retries and the module's own state machine.
/// All methods must return promptly; waiting happens on the [`Completion`].
pub trait DeviceCommandPort: Send + Sync {
    /// Start the protocol engine.
    fn start(&self);

    /// Submit a basic DR command with an event duration in seconds (0 = indefinite).
    fn issue(&self, command: BasicCommand, duration_s: u32) -> Completion;

    fn query(&self, query: DeviceQuery) -> Completion;

    fn announce_connection_status(&self, status: OutsideCommStatus);

    /// Last operational state the module reported.
    fn operational_state(&self) -> DeviceOpState;

    /// Readings captured by the most recent commodity query.
    fn commodity_readings(&self) -> Vec<CommodityReading>;
}
