//! Gesture interfaces - map the selected hand's geometry to adapter commands
//!
//! Every interface shares one lifecycle: it starts disabled, is switched with
//! [`Interface::enable`]/[`Interface::disable`], and on each frame runs the
//! common gate in [`InterfaceBase`] before its own gesture logic.
//!
//! | Interface | Adapter | Gesture |
//! |---|---|---|
//! | [`MouseInterface`] | cursor | tracker position → cursor, thumb–index pinch → click |
//! | [`LedInterface`] | serial | thumb pinch per finger → toggle LED 0–3 |
//! | [`LightInterface`] | serial | thumb–index pinch change → `LIGHT TOGGLE` |
//! | [`MotorInterface`] | serial | thumb–index distance → `THROTTLE 0-10` |

mod led;
mod light;
mod motor;
mod mouse;

pub use led::{LedInterface, LedSettings, LED_CHANNELS};
pub use light::{LightInterface, LightSettings};
pub use motor::{throttle_for_distance, MotorInterface, MotorSettings, MAX_THROTTLE};
pub use mouse::{ClickMode, MouseInterface, MouseSettings};

use crate::adapters::{AdapterError, SharedCursor, SharedSerial};
use crate::payload::{FramePayload, Hand, Handedness, NUM_LANDMARKS};
use log::{debug, info};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Context key for the cursor adapter
pub const MOUSE_CONTROLLER: &str = "mouse_controller";
/// Context key for the ESP32 serial adapter
pub const ESP32_SERIAL_ADAPTER: &str = "esp32_serial_adapter";

/// Error type for interface construction and per-frame processing
#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("{interface} requires '{key}' in context")]
    MissingAdapter { interface: &'static str, key: String },
    #[error("'{key}' in context is not a {expected} adapter")]
    WrongAdapter { key: String, expected: &'static str },
    #[error("{interface}: landmark index {index} is out of range (max {max})")]
    LandmarkOutOfRange {
        interface: &'static str,
        index: usize,
        max: usize,
    },
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Reject landmark indices a [`Hand`] cannot be indexed with
pub(crate) fn check_landmarks(
    interface: &'static str,
    indices: &[usize],
) -> Result<(), InterfaceError> {
    match indices.iter().find(|&&index| index >= NUM_LANDMARKS) {
        Some(&index) => Err(InterfaceError::LandmarkOutOfRange {
            interface,
            index,
            max: NUM_LANDMARKS - 1,
        }),
        None => Ok(()),
    }
}

// ============================================================================
// Context
// ============================================================================

/// An adapter registered in the shared context
#[derive(Clone)]
pub enum Adapter {
    Cursor(SharedCursor),
    Serial(SharedSerial),
}

/// Adapters available to interfaces at construction time, keyed by name
#[derive(Clone, Default)]
pub struct Context {
    adapters: HashMap<String, Adapter>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_cursor(&mut self, key: &str, cursor: SharedCursor) {
        self.adapters.insert(key.to_string(), Adapter::Cursor(cursor));
    }

    pub fn insert_serial(&mut self, key: &str, serial: SharedSerial) {
        self.adapters.insert(key.to_string(), Adapter::Serial(serial));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.adapters.contains_key(key)
    }

    /// Look up a cursor adapter for `interface`
    pub fn cursor(&self, interface: &'static str, key: &str) -> Result<SharedCursor, InterfaceError> {
        match self.adapters.get(key) {
            Some(Adapter::Cursor(cursor)) => Ok(Rc::clone(cursor)),
            Some(_) => Err(InterfaceError::WrongAdapter {
                key: key.to_string(),
                expected: "cursor",
            }),
            None => Err(InterfaceError::MissingAdapter {
                interface,
                key: key.to_string(),
            }),
        }
    }

    /// Look up a serial adapter for `interface`
    pub fn serial(&self, interface: &'static str, key: &str) -> Result<SharedSerial, InterfaceError> {
        match self.adapters.get(key) {
            Some(Adapter::Serial(serial)) => Ok(Rc::clone(serial)),
            Some(_) => Err(InterfaceError::WrongAdapter {
                key: key.to_string(),
                expected: "serial",
            }),
            None => Err(InterfaceError::MissingAdapter {
                interface,
                key: key.to_string(),
            }),
        }
    }
}

// ============================================================================
// Interface trait
// ============================================================================

/// Capability shared by every gesture interface
pub trait Interface {
    fn base(&self) -> &InterfaceBase;
    fn base_mut(&mut self) -> &mut InterfaceBase;

    /// Inspect one frame and issue adapter commands.
    ///
    /// Adapter failures are returned as-is; nothing is retried.
    fn on_frame(&mut self, payload: &FramePayload) -> Result<(), InterfaceError>;

    fn id(&self) -> &'static str {
        self.base().id()
    }

    fn name(&self) -> &'static str {
        self.base().name()
    }

    fn is_enabled(&self) -> bool {
        self.base().is_enabled()
    }

    fn enable(&mut self) {
        self.base_mut().enable();
    }

    fn disable(&mut self) {
        self.base_mut().disable();
    }
}

/// Lifecycle and hand-selection state common to all interfaces
#[derive(Debug, Clone)]
pub struct InterfaceBase {
    id: &'static str,
    name: &'static str,
    hand_preference: Handedness,
    enabled: bool,
    /// Index into the current payload's hands, reset every frame
    selected_hand: Option<usize>,
}

impl InterfaceBase {
    pub fn new(id: &'static str, name: &'static str, hand_preference: Handedness) -> Self {
        Self {
            id,
            name,
            hand_preference,
            enabled: false,
            selected_hand: None,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn hand_preference(&self) -> Handedness {
        self.hand_preference
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn selected_hand(&self) -> Option<usize> {
        self.selected_hand
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        info!("[{}] {} enabled", self.id, self.name);
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        info!("[{}] {} disabled", self.id, self.name);
    }

    /// Common per-frame gate. Returns `false` when the frame should not be
    /// processed: the interface is disabled or no hands were detected.
    pub fn begin_frame(&mut self, payload: &FramePayload) -> bool {
        if !self.enabled {
            return false;
        }

        self.selected_hand = None;

        if !payload.has_hands() {
            debug!("[{}] No hands detected", self.id);
            return false;
        }
        true
    }

    /// Select the first hand matching the preferred handedness
    pub fn find_hand<'p>(&mut self, payload: &'p FramePayload) -> Option<&'p Hand> {
        self.selected_hand = select_hand(payload, self.hand_preference);
        match self.selected_hand {
            Some(i) => payload.hands().get(i),
            None => {
                debug!("[{}] No {} hand detected this frame", self.id, self.hand_preference);
                None
            }
        }
    }
}

/// Index of the first hand with the given handedness, in detector order
pub fn select_hand(payload: &FramePayload, preference: Handedness) -> Option<usize> {
    payload
        .hands()
        .iter()
        .position(|hand| hand.handedness() == preference)
}
