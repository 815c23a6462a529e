pub mod factory;
pub mod port;
pub mod sensor;
pub mod simulated;
pub mod transport;

pub use factory::{DeviceFactory, DeviceStack, HardwareMode};
pub use port::{Completer, Completion, DeviceCommandPort, DeviceError};
pub use sensor::{CurrentSensor, SimulatedCurrentTransducer};
pub use simulated::SimulatedUcm;
#[cfg(feature = "serial")]
pub use transport::SerialTransport;
pub use transport::{LoopbackTransport, Transport, UnavailableTransport};
