//! Single light toggled whenever the thumb–index pinch changes state

use super::{
    check_landmarks, Context, ESP32_SERIAL_ADAPTER, Interface, InterfaceBase, InterfaceError,
};
use crate::adapters::SharedSerial;
use crate::payload::{landmarks, FramePayload, Handedness};
use log::debug;

const TOGGLE_COMMAND: &str = "LIGHT TOGGLE";

#[derive(Debug, Clone)]
pub struct LightSettings {
    pub hand: Handedness,
    pub thumb_tip: usize,
    pub index_tip: usize,
    pub pinch_threshold: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            hand: Handedness::Right,
            thumb_tip: landmarks::THUMB_TIP,
            index_tip: landmarks::INDEX_FINGER_TIP,
            pinch_threshold: 0.03,
        }
    }
}

pub struct LightInterface {
    base: InterfaceBase,
    serial: SharedSerial,
    settings: LightSettings,
    pinch_state: bool,
}

impl LightInterface {
    pub const ID: &'static str = "light";
    pub const NAME: &'static str = "Light Interface";

    pub fn new(context: &Context, settings: LightSettings) -> Result<Self, InterfaceError> {
        check_landmarks(Self::NAME, &[settings.thumb_tip, settings.index_tip])?;
        let serial = context.serial(Self::NAME, ESP32_SERIAL_ADAPTER)?;
        Ok(Self {
            base: InterfaceBase::new(Self::ID, Self::NAME, settings.hand),
            serial,
            settings,
            pinch_state: false,
        })
    }

    pub fn pinch_state(&self) -> bool {
        self.pinch_state
    }
}

impl Interface for LightInterface {
    fn base(&self) -> &InterfaceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InterfaceBase {
        &mut self.base
    }

    fn on_frame(&mut self, payload: &FramePayload) -> Result<(), InterfaceError> {
        if !self.base.begin_frame(payload) {
            return Ok(());
        }
        let Some(hand) = self.base.find_hand(payload) else {
            return Ok(());
        };

        let is_pinch = hand.is_pinching(
            self.settings.thumb_tip,
            self.settings.index_tip,
            self.settings.pinch_threshold,
        );

        // Both pinch and release flip the light
        if is_pinch != self.pinch_state {
            self.serial.borrow_mut().write_line(TOGGLE_COMMAND)?;
            self.pinch_state = is_pinch;
            debug!("[{}] Pinch state {}, toggled light", Self::ID, is_pinch);
        }
        Ok(())
    }
}
