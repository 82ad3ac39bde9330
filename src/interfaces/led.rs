//! Four LEDs, one per finger: pinching the thumb against a finger toggles its LED

use super::{
    check_landmarks, Context, ESP32_SERIAL_ADAPTER, Interface, InterfaceBase, InterfaceError,
};
use crate::adapters::SharedSerial;
use crate::payload::{landmarks, FramePayload, Handedness};
use log::debug;

/// Number of LED channels (index, middle, ring, pinky)
pub const LED_CHANNELS: usize = 4;

#[derive(Debug, Clone)]
pub struct LedSettings {
    pub hand: Handedness,
    pub thumb_tip: usize,
    /// Fingertips for channels 0..4
    pub finger_tips: [usize; LED_CHANNELS],
    pub pinch_threshold: f32,
}

impl Default for LedSettings {
    fn default() -> Self {
        Self {
            hand: Handedness::Right,
            thumb_tip: landmarks::THUMB_TIP,
            finger_tips: [
                landmarks::INDEX_FINGER_TIP,
                landmarks::MIDDLE_FINGER_TIP,
                landmarks::RING_FINGER_TIP,
                landmarks::PINKY_TIP,
            ],
            pinch_threshold: 0.03,
        }
    }
}

pub struct LedInterface {
    base: InterfaceBase,
    serial: SharedSerial,
    settings: LedSettings,
    led_states: [bool; LED_CHANNELS],
    /// Pinch state per finger from the previous processed frame
    pinch_active: [bool; LED_CHANNELS],
}

impl LedInterface {
    pub const ID: &'static str = "led";
    pub const NAME: &'static str = "LED Interface";

    pub fn new(context: &Context, settings: LedSettings) -> Result<Self, InterfaceError> {
        check_landmarks(Self::NAME, &[settings.thumb_tip])?;
        check_landmarks(Self::NAME, &settings.finger_tips)?;
        let serial = context.serial(Self::NAME, ESP32_SERIAL_ADAPTER)?;
        Ok(Self {
            base: InterfaceBase::new(Self::ID, Self::NAME, settings.hand),
            serial,
            settings,
            led_states: [false; LED_CHANNELS],
            pinch_active: [false; LED_CHANNELS],
        })
    }

    pub fn led_states(&self) -> [bool; LED_CHANNELS] {
        self.led_states
    }
}

impl Interface for LedInterface {
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

        let distances = self
            .settings
            .finger_tips
            .map(|tip| hand.world_distance(self.settings.thumb_tip, tip));
        debug!(
            "[{}] Distances: {:.4}, {:.4}, {:.4}, {:.4}",
            Self::ID,
            distances[0],
            distances[1],
            distances[2],
            distances[3]
        );

        for (channel, distance) in distances.into_iter().enumerate() {
            let is_pinch = distance < self.settings.pinch_threshold;

            // Toggle only when going from not-pinched to pinched
            if is_pinch && !self.pinch_active[channel] {
                let lit = !self.led_states[channel];
                let level = if lit { 'H' } else { 'L' };
                let command = format!("LED {} {}", level, channel);
                self.serial.borrow_mut().write_line(&command)?;
                self.led_states[channel] = lit;
                debug!("[{}] Pinch on finger {}, sent: {}", Self::ID, channel, command);
            }

            self.pinch_active[channel] = is_pinch;
        }
        Ok(())
    }
}
