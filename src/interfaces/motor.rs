//! Motor throttle driven by the thumb–index spread

use super::{
    check_landmarks, Context, ESP32_SERIAL_ADAPTER, Interface, InterfaceBase, InterfaceError,
};
use crate::adapters::SharedSerial;
use crate::payload::{landmarks, FramePayload, Handedness};
use log::debug;

/// Highest throttle step the firmware accepts
pub const MAX_THROTTLE: u8 = 10;

#[derive(Debug, Clone)]
pub struct MotorSettings {
    pub hand: Handedness,
    pub thumb_tip: usize,
    pub index_tip: usize,
    /// Distance at or below which the motor stops (the pinch threshold)
    pub low_threshold: f32,
    /// Distance at or above which the throttle is full
    pub high_bound: f32,
}

impl Default for MotorSettings {
    fn default() -> Self {
        Self {
            hand: Handedness::Right,
            thumb_tip: landmarks::THUMB_TIP,
            index_tip: landmarks::INDEX_FINGER_TIP,
            low_threshold: 0.03,
            high_bound: 0.15,
        }
    }
}

/// Map a world-space distance linearly onto `0..=MAX_THROTTLE`, truncating.
///
/// With `high <= low` the mapping degenerates to a step at `high`:
/// 0 below it, full throttle at or above it.
pub fn throttle_for_distance(distance: f32, low: f32, high: f32) -> u8 {
    if distance.is_nan() {
        return 0;
    }
    if distance >= high {
        return MAX_THROTTLE;
    }
    if distance <= low {
        return 0;
    }
    let speed = (distance - low) / (high - low) * f32::from(MAX_THROTTLE);
    speed.clamp(0.0, f32::from(MAX_THROTTLE)) as u8
}

pub struct MotorInterface {
    base: InterfaceBase,
    serial: SharedSerial,
    settings: MotorSettings,
    last_throttle: Option<u8>,
}

impl MotorInterface {
    pub const ID: &'static str = "motor";
    pub const NAME: &'static str = "Motor Interface";

    pub fn new(context: &Context, settings: MotorSettings) -> Result<Self, InterfaceError> {
        check_landmarks(Self::NAME, &[settings.thumb_tip, settings.index_tip])?;
        let serial = context.serial(Self::NAME, ESP32_SERIAL_ADAPTER)?;
        Ok(Self {
            base: InterfaceBase::new(Self::ID, Self::NAME, settings.hand),
            serial,
            settings,
            last_throttle: None,
        })
    }

    /// Throttle of the last command sent, if any
    pub fn last_throttle(&self) -> Option<u8> {
        self.last_throttle
    }
}

impl Interface for MotorInterface {
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

        let distance = hand.world_distance(self.settings.thumb_tip, self.settings.index_tip);
        let throttle = throttle_for_distance(
            distance,
            self.settings.low_threshold,
            self.settings.high_bound,
        );

        // Sent every frame, no deadband
        let command = format!("THROTTLE {}", throttle);
        self.serial.borrow_mut().write_line(&command)?;
        self.last_throttle = Some(throttle);
        debug!("[{}] Distance {:.4}, sent: {}", Self::ID, distance, command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hand_with_pinch, payload, recording_serial, written_lines, ByteLog};

    fn enabled_motor() -> (MotorInterface, ByteLog) {
        let (serial, output) = recording_serial();
        let mut context = Context::new();
        context.insert_serial(ESP32_SERIAL_ADAPTER, serial);
        let mut motor = MotorInterface::new(&context, MotorSettings::default()).unwrap();
        motor.enable();
        (motor, output)
    }

    #[test]
    fn test_throttle_bounds() {
        assert_eq!(throttle_for_distance(0.0, 0.03, 0.15), 0);
        assert_eq!(throttle_for_distance(0.03, 0.03, 0.15), 0);
        assert_eq!(throttle_for_distance(0.15, 0.03, 0.15), 10);
        assert_eq!(throttle_for_distance(2.0, 0.03, 0.15), 10);
        assert_eq!(throttle_for_distance(f32::NAN, 0.03, 0.15), 0);
    }

    #[test]
    fn test_throttle_midpoint_truncates() {
        // (0.09 - 0.03) / 0.12 * 10 = 5.0, nudged down by float error at most to 4
        let mid = throttle_for_distance(0.09, 0.03, 0.15);
        assert!(mid == 4 || mid == 5);
        // 0.0939 → 5.325 → 5
        assert_eq!(throttle_for_distance(0.0939, 0.03, 0.15), 5);
    }

    #[test]
    fn test_throttle_monotonic() {
        let mut previous = 0;
        for step in 0..=200 {
            let distance = step as f32 * 0.001;
            let throttle = throttle_for_distance(distance, 0.03, 0.15);
            assert!(throttle >= previous, "dropped at {}", distance);
            assert!(throttle <= MAX_THROTTLE);
            previous = throttle;
        }
        assert_eq!(previous, MAX_THROTTLE);
    }

    #[test]
    fn test_degenerate_bounds_step() {
        assert_eq!(throttle_for_distance(0.05, 0.1, 0.1), 0);
        assert_eq!(throttle_for_distance(0.1, 0.1, 0.1), 10);
        assert_eq!(throttle_for_distance(0.11, 0.1, 0.1), 10);

        // inverted bounds: the step sits at `high`, not `low`
        assert_eq!(throttle_for_distance(0.04, 0.1, 0.05), 0);
        assert_eq!(throttle_for_distance(0.05, 0.1, 0.05), 10);
        assert_eq!(throttle_for_distance(0.07, 0.1, 0.05), 10);
    }

    #[test]
    fn test_no_hands_keeps_state_and_sends_nothing() {
        let (mut motor, output) = enabled_motor();
        motor.on_frame(&payload(vec![hand_with_pinch(Handedness::Right, 0.5)])).unwrap();
        output.borrow_mut().clear();

        motor.on_frame(&payload(vec![])).unwrap();

        assert!(written_lines(&output).is_empty());
        assert_eq!(motor.last_throttle(), Some(10));
    }

    #[test]
    fn test_sends_every_frame() {
        let (mut motor, output) = enabled_motor();

        motor.on_frame(&payload(vec![hand_with_pinch(Handedness::Right, 0.01)])).unwrap();
        motor.on_frame(&payload(vec![hand_with_pinch(Handedness::Right, 0.01)])).unwrap();
        motor.on_frame(&payload(vec![hand_with_pinch(Handedness::Right, 0.5)])).unwrap();

        assert_eq!(
            written_lines(&output),
            vec!["THROTTLE 0", "THROTTLE 0", "THROTTLE 10"]
        );
        assert_eq!(motor.last_throttle(), Some(10));
    }

    #[test]
    fn test_left_hand_ignored() {
        let (mut motor, output) = enabled_motor();
        motor.on_frame(&payload(vec![hand_with_pinch(Handedness::Left, 0.1)])).unwrap();

        assert!(written_lines(&output).is_empty());
        assert_eq!(motor.last_throttle(), None);
    }
}
