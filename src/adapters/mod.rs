//! Adapters turn interface commands into physical or OS effects
//!
//! - [`CursorAdapter`]: normalized cursor moves and clicks, over any
//!   [`PointerBackend`] (enigo when the `cursor` feature is enabled)
//! - [`SerialAdapter`]: newline-terminated text commands to a microcontroller

mod cursor;
mod serial;

pub use cursor::{ButtonAction, CursorAdapter, MouseButton, PointerBackend, SharedCursor};
#[cfg(feature = "cursor")]
pub use cursor::EnigoPointer;
pub use serial::{
    list_ports, SerialAdapter, SerialStream, SharedSerial, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT,
};

use thiserror::Error;

/// Error type for adapter operations
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("serial port '{0}' is not open")]
    NotOpen(String),
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("input injection failed: {0}")]
    Input(String),
    #[error("no READY_ACK from '{name}' after {attempts} attempts")]
    Handshake { name: String, attempts: usize },
}
