//! Line-oriented serial link to the ESP32 firmware
//!
//! Commands are plain text terminated by `\n` (`LED H 0`, `THROTTLE 7`,
//! `LIGHT TOGGLE`). The port is opened through `serialport` at the firmware's
//! baud rate; reads give up after the configured timeout.

use super::AdapterError;
use log::{debug, info};
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

/// Baud rate the firmware configures with `Serial.begin`
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Time the board needs to reboot after the port is opened
const SETTLE_DELAY: Duration = Duration::from_secs(2);

const HANDSHAKE_REQUEST: &str = "READY";
const HANDSHAKE_ACK: &str = "READY_ACK";

/// Anything that can carry the serial byte stream
pub trait SerialStream: Read + Write {}

impl<T: Read + Write> SerialStream for T {}

/// Type alias for the serial adapter shared between interfaces
pub type SharedSerial = Rc<RefCell<SerialAdapter>>;

pub struct SerialAdapter {
    name: String,
    port: String,
    baud_rate: u32,
    timeout: Duration,
    connection: Option<Box<dyn SerialStream>>,
}

/// Device names of the serial ports the OS reports
pub fn list_ports() -> Result<Vec<String>, AdapterError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

impl SerialAdapter {
    /// Create a closed adapter for `port`
    pub fn new(name: &str, port: &str, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            port: port.to_string(),
            baud_rate,
            timeout,
            connection: None,
        }
    }

    /// Create an adapter over an already-open stream
    pub fn with_stream(name: &str, stream: Box<dyn SerialStream>) -> Self {
        Self {
            name: name.to_string(),
            port: String::from("<stream>"),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_READ_TIMEOUT,
            connection: Some(stream),
        }
    }

    /// Wrap into the shared handle interfaces expect
    pub fn shared(self) -> SharedSerial {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Open the configured port and wait for the board to settle
    pub fn open(&mut self) -> Result<(), AdapterError> {
        let port = serialport::new(self.port.as_str(), self.baud_rate)
            .timeout(self.timeout)
            .open()?;
        self.connection = Some(Box::new(port));
        thread::sleep(SETTLE_DELAY);
        info!(
            "[{}] Connected to {} at {} baud",
            self.name, self.port, self.baud_rate
        );
        Ok(())
    }

    /// Flush and drop the connection. Closing a closed adapter is a no-op.
    pub fn close(&mut self) -> Result<(), AdapterError> {
        if let Some(mut conn) = self.connection.take() {
            conn.flush()?;
            info!("[{}] Serial connection closed", self.name);
        }
        Ok(())
    }

    /// Send one command line. Fails without retry when the port is closed.
    pub fn write_line(&mut self, line: &str) -> Result<(), AdapterError> {
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| AdapterError::NotOpen(self.port.clone()))?;
        conn.write_all(format!("{}\n", line).as_bytes())?;
        conn.flush()?;
        debug!("[{}] Sent: {}", self.name, line);
        Ok(())
    }

    /// Send `READY` and wait for `READY_ACK`, reading at most `max_attempts` lines
    pub fn establish_connection(&mut self, max_attempts: usize) -> Result<(), AdapterError> {
        self.write_line(HANDSHAKE_REQUEST)?;
        for attempt in 1..=max_attempts {
            let response = self.read_line()?;
            if response == HANDSHAKE_ACK {
                info!("[{}] Connection established", self.name);
                return Ok(());
            }
            debug!(
                "[{}] Waiting for {} ({}/{}), received: {:?}",
                self.name, HANDSHAKE_ACK, attempt, max_attempts, response
            );
        }
        Err(AdapterError::Handshake {
            name: self.name.clone(),
            attempts: max_attempts,
        })
    }

    /// Read one trimmed line; an exhausted or silent stream yields what arrived so far
    fn read_line(&mut self) -> Result<String, AdapterError> {
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| AdapterError::NotOpen(self.port.clone()))?;
        let mut bytes = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match conn.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => bytes.push(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }
}
