use async_trait::async_trait;
use std::io;
use tracing::debug;

/// Physical link to the communication module.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the link. An error here is fatal for the controller.
    async fn open(&mut self) -> io::Result<()>;

    /// Identifier used in log lines (e.g. the tty path).
    fn describe(&self) -> String;
}

/// In-process link used with the simulated module.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    open: bool,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn open(&mut self) -> io::Result<()> {
        self.open = true;
        Ok(())
    }

    fn describe(&self) -> String {
        "loopback".to_string()
    }
}

/// Serial link to a CEA-2045 module (RS-485 adapter or UART). The port stays
/// open for the lifetime of the controller.
#[cfg(feature = "serial")]
pub struct SerialTransport {
    path: String,
    baud: u32,
    #[allow(dead_code)]
    stream: Option<tokio_serial::SerialStream>,
}

#[cfg(feature = "serial")]
impl SerialTransport {
    pub fn new(path: impl Into<String>, baud: u32) -> Self {
        Self {
            path: path.into(),
            baud,
            stream: None,
        }
    }
}

#[cfg(feature = "serial")]
#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> io::Result<()> {
        use tokio_serial::SerialPortBuilderExt;

        debug!(path = %self.path, baud = self.baud, "opening serial port");
        let stream = tokio_serial::new(&self.path, self.baud).open_native_async()?;
        self.stream = Some(stream);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.path, self.baud)
    }
}

/// Stand-in for a link this build cannot provide; opening always fails.
#[derive(Debug)]
pub struct UnavailableTransport {
    path: String,
    reason: &'static str,
}

impl UnavailableTransport {
    pub fn new(path: impl Into<String>, reason: &'static str) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

#[async_trait]
impl Transport for UnavailableTransport {
    async fn open(&mut self) -> io::Result<()> {
        debug!(path = %self.path, reason = self.reason, "transport unavailable");
        Err(io::Error::new(io::ErrorKind::Unsupported, self.reason))
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loopback_opens() {
        let mut t = LoopbackTransport::new();
        t.open().await.unwrap();
        assert!(t.is_open());
    }

    #[tokio::test]
    async fn unavailable_transport_reports_reason() {
        let mut t = UnavailableTransport::new("/dev/ttyUSB0", "serial support not compiled in");
        let err = t.open().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(t.describe(), "/dev/ttyUSB0");
    }
}
