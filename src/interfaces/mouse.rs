//! Cursor control: one landmark steers the pointer, a thumb–index pinch clicks

use super::{check_landmarks, Context, Interface, InterfaceBase, InterfaceError, MOUSE_CONTROLLER};
use crate::adapters::SharedCursor;
use crate::payload::{landmarks, FramePayload, Handedness};
use log::debug;
use serde::Deserialize;

/// When a held pinch produces clicks
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClickMode {
    /// Click on every frame the pinch holds (default)
    #[default]
    Level,
    /// Click once when the pinch starts
    Edge,
}

#[derive(Debug, Clone)]
pub struct MouseSettings {
    pub hand: Handedness,
    /// Normalized landmark that drives the cursor
    pub tracker_landmark: usize,
    pub thumb_tip: usize,
    pub index_tip: usize,
    /// World-space thumb–index distance below which a click fires
    pub click_threshold: f32,
    pub click_mode: ClickMode,
}

impl Default for MouseSettings {
    fn default() -> Self {
        Self {
            hand: Handedness::Right,
            tracker_landmark: landmarks::INDEX_FINGER_TIP,
            thumb_tip: landmarks::THUMB_TIP,
            index_tip: landmarks::INDEX_FINGER_TIP,
            click_threshold: 0.03,
            click_mode: ClickMode::Level,
        }
    }
}

pub struct MouseInterface {
    base: InterfaceBase,
    cursor: SharedCursor,
    settings: MouseSettings,
    /// Last normalized cursor position sent
    position: (f32, f32),
    pinch_active: bool,
}

impl MouseInterface {
    pub const ID: &'static str = "cursor";
    pub const NAME: &'static str = "Cursor Interface";

    pub fn new(context: &Context, settings: MouseSettings) -> Result<Self, InterfaceError> {
        check_landmarks(
            Self::NAME,
            &[settings.tracker_landmark, settings.thumb_tip, settings.index_tip],
        )?;
        let cursor = context.cursor(Self::NAME, MOUSE_CONTROLLER)?;
        Ok(Self {
            base: InterfaceBase::new(Self::ID, Self::NAME, settings.hand),
            cursor,
            settings,
            position: (0.5, 0.5),
            pinch_active: false,
        })
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }
}

impl Interface for MouseInterface {
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

        // Mirror x: the camera faces the user
        let tracker = hand.landmarks()[self.settings.tracker_landmark];
        self.position = (1.0 - tracker.x, tracker.y);
        self.cursor
            .borrow_mut()
            .move_norm(self.position.0, self.position.1)?;
        debug!(
            "[{}] Cursor moved to ({:.2}, {:.2})",
            Self::ID,
            self.position.0,
            self.position.1
        );

        let touching = hand.is_pinching(
            self.settings.thumb_tip,
            self.settings.index_tip,
            self.settings.click_threshold,
        );
        let click = match self.settings.click_mode {
            ClickMode::Level => touching,
            ClickMode::Edge => touching && !self.pinch_active,
        };
        self.pinch_active = touching;

        if click {
            self.cursor.borrow_mut().click_once()?;
            debug!("[{}] Click", Self::ID);
        }
        Ok(())
    }
}
