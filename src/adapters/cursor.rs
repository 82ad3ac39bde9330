//! Cursor control over a pluggable pointer backend
//!
//! [`CursorAdapter`] owns the screen geometry and the normalized-to-pixel
//! mapping; the backend only has to move the pointer and press buttons.
//! With the `cursor` feature, [`EnigoPointer`] drives the real OS pointer.

use super::AdapterError;
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

/// Pause between the two clicks of a double click
const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Press,
    Release,
    Click,
}

/// Low-level pointer device
pub trait PointerBackend {
    /// Main display size in pixels
    fn screen_size(&self) -> Result<(u32, u32), AdapterError>;
    /// Move to absolute pixel coordinates
    fn move_to(&mut self, x: i32, y: i32) -> Result<(), AdapterError>;
    fn button(&mut self, button: MouseButton, action: ButtonAction) -> Result<(), AdapterError>;
    /// Scroll by whole notches; positive `dy` scrolls down, positive `dx` right
    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), AdapterError>;
}

/// Type alias for the cursor shared between interfaces
pub type SharedCursor = Rc<RefCell<CursorAdapter>>;

/// Normalized cursor control
pub struct CursorAdapter {
    backend: Box<dyn PointerBackend>,
    screen_width: u32,
    screen_height: u32,
    mouse_down: bool,
}

impl CursorAdapter {
    /// Create a cursor adapter, querying the backend once for the screen size
    pub fn new(backend: Box<dyn PointerBackend>) -> Result<Self, AdapterError> {
        let (screen_width, screen_height) = backend.screen_size()?;
        if screen_width == 0 || screen_height == 0 {
            return Err(AdapterError::Input(format!(
                "Backend reported an empty screen ({}x{})",
                screen_width, screen_height
            )));
        }
        Ok(Self {
            backend,
            screen_width,
            screen_height,
            mouse_down: false,
        })
    }

    /// Wrap into the shared handle interfaces expect
    pub fn shared(self) -> SharedCursor {
        Rc::new(RefCell::new(self))
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    pub fn is_mouse_down(&self) -> bool {
        self.mouse_down
    }

    /// Map normalized coordinates to a pixel inside the screen.
    ///
    /// Inputs are clamped to `[0,1]` component-wise first.
    pub fn to_pixels(&self, x: f32, y: f32) -> (i32, i32) {
        let x = clamp_unit(x);
        let y = clamp_unit(y);
        let px = ((x * self.screen_width as f32) as u32).min(self.screen_width - 1);
        let py = ((y * self.screen_height as f32) as u32).min(self.screen_height - 1);
        (px as i32, py as i32)
    }

    /// Move the cursor to normalized screen coordinates, returns the pixel target
    pub fn move_norm(&mut self, x: f32, y: f32) -> Result<(i32, i32), AdapterError> {
        let (cx, cy) = (clamp_unit(x), clamp_unit(y));
        if cx != x || cy != y {
            warn!(
                "[cursor] move_norm received out-of-bounds values ({:.4}, {:.4}), clamped to ({:.4}, {:.4})",
                x, y, cx, cy
            );
        }
        let (px, py) = self.to_pixels(cx, cy);
        self.backend.move_to(px, py)?;
        Ok((px, py))
    }

    pub fn click_once(&mut self) -> Result<(), AdapterError> {
        self.backend.button(MouseButton::Left, ButtonAction::Click)
    }

    pub fn double_click(&mut self) -> Result<(), AdapterError> {
        self.backend.button(MouseButton::Left, ButtonAction::Click)?;
        thread::sleep(DOUBLE_CLICK_INTERVAL);
        self.backend.button(MouseButton::Left, ButtonAction::Click)
    }

    pub fn mouse_down(&mut self) -> Result<(), AdapterError> {
        self.backend.button(MouseButton::Left, ButtonAction::Press)?;
        self.mouse_down = true;
        Ok(())
    }

    pub fn mouse_up(&mut self) -> Result<(), AdapterError> {
        self.backend.button(MouseButton::Left, ButtonAction::Release)?;
        self.mouse_down = false;
        Ok(())
    }

    pub fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), AdapterError> {
        if dx == 0 && dy == 0 {
            return Ok(());
        }
        self.backend.scroll(dx, dy)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

// ============================================================================
// Enigo backend
// ============================================================================

#[cfg(feature = "cursor")]
pub use self::enigo_backend::EnigoPointer;

#[cfg(feature = "cursor")]
mod enigo_backend {
    use super::{AdapterError, ButtonAction, MouseButton, PointerBackend};
    use enigo::{Axis, Button, Coordinate, Direction, Enigo, Mouse, Settings};

    /// OS pointer driven through enigo
    pub struct EnigoPointer {
        enigo: Enigo,
    }

    impl EnigoPointer {
        pub fn new() -> Result<Self, AdapterError> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| AdapterError::Input(format!("Failed to initialize Enigo: {}", e)))?;
            Ok(Self { enigo })
        }
    }

    impl PointerBackend for EnigoPointer {
        fn screen_size(&self) -> Result<(u32, u32), AdapterError> {
            let (w, h) = self
                .enigo
                .main_display()
                .map_err(|e| AdapterError::Input(format!("Failed to query display: {}", e)))?;
            Ok((w.max(0) as u32, h.max(0) as u32))
        }

        fn move_to(&mut self, x: i32, y: i32) -> Result<(), AdapterError> {
            self.enigo
                .move_mouse(x, y, Coordinate::Abs)
                .map_err(|e| AdapterError::Input(format!("Failed to move mouse: {}", e)))
        }

        fn button(&mut self, button: MouseButton, action: ButtonAction) -> Result<(), AdapterError> {
            let button = match button {
                MouseButton::Left => Button::Left,
                MouseButton::Right => Button::Right,
                MouseButton::Middle => Button::Middle,
            };
            let direction = match action {
                ButtonAction::Press => Direction::Press,
                ButtonAction::Release => Direction::Release,
                ButtonAction::Click => Direction::Click,
            };
            self.enigo
                .button(button, direction)
                .map_err(|e| AdapterError::Input(format!("Failed to send button: {}", e)))
        }

        fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), AdapterError> {
            if dy != 0 {
                self.enigo
                    .scroll(dy, Axis::Vertical)
                    .map_err(|e| AdapterError::Input(format!("Failed to scroll: {}", e)))?;
            }
            if dx != 0 {
                self.enigo
                    .scroll(dx, Axis::Horizontal)
                    .map_err(|e| AdapterError::Input(format!("Failed to scroll: {}", e)))?;
            }
            Ok(())
        }
    }
}
