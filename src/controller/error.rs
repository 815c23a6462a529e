use std::io;
use thiserror::Error;

use crate::domain::DeviceQuery;
use crate::hardware::DeviceError;

#[derive(Debug, Error)]
pub enum ControllerError {
    /// The link to the module could not be opened. Fatal.
    #[error("transport {transport} unavailable: {source}")]
    TransportUnavailable {
        transport: String,
        #[source]
        source: io::Error,
    },

    #[error("handshake query {query} failed: {source}")]
    Handshake {
        query: DeviceQuery,
        #[source]
        source: DeviceError,
    },

    /// The configured hardware cannot be driven by this build.
    #[error("hardware unavailable: {0}")]
    Hardware(#[source] DeviceError),

    #[error("cannot open telemetry log: {0}")]
    Sink(#[source] io::Error),
}

impl ControllerError {
    /// Whether the process should exit instead of serving.
    pub fn is_fatal_transport(&self) -> bool {
        matches!(self, ControllerError::TransportUnavailable { .. })
    }
}
