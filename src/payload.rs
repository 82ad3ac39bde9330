//! Per-frame hand snapshot consumed by every interface
//!
//! A [`FramePayload`] is built once per frame from the detector output and is
//! read-only afterwards. Interfaces borrow it for the duration of `on_frame`
//! and may only keep derived scalars (pinch flags, last cursor position).

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Number of landmarks the hand model emits per hand, in both coordinate spaces.
pub const NUM_LANDMARKS: usize = 21;

/// Hand landmark indices (MediaPipe hand landmark model order)
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Error type for payload construction
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("hand must have exactly {expected} {kind} landmarks, got {got}")]
    LandmarkCount {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("confidence must be in [0,1], got {0}")]
    Confidence(f32),
    #[error("frame size must be positive, got {width}x{height}")]
    FrameSize { width: u32, height: u32 },
}

/// A single tracked point.
///
/// Normalized landmarks are image-relative (nominally `[0,1]`, not enforced);
/// world landmarks are metric and camera-relative.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another landmark
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    fn in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Classification of a detected hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Handedness {
    #[serde(alias = "L", alias = "left")]
    Left,
    #[serde(alias = "R", alias = "right")]
    Right,
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => write!(f, "Left"),
            Handedness::Right => write!(f, "Right"),
        }
    }
}

/// One detected hand with both landmark sets
#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    handedness: Handedness,
    confidence: f32,
    in_frame: bool,
    landmarks: [Landmark; NUM_LANDMARKS],
    world_landmarks: [Landmark; NUM_LANDMARKS],
}

impl Hand {
    /// Build a hand, rejecting anything that is not exactly 21 + 21 landmarks
    /// with a confidence in `[0,1]`.
    ///
    /// `in_frame` is derived: false if any normalized landmark lies outside
    /// `[0,1]` on x or y. Such landmarks are kept as-is.
    pub fn new(
        handedness: Handedness,
        confidence: f32,
        landmarks: &[Landmark],
        world_landmarks: &[Landmark],
    ) -> Result<Self, PayloadError> {
        let landmarks = to_array(landmarks, "normalized")?;
        let world_landmarks = to_array(world_landmarks, "world")?;

        if !(0.0..=1.0).contains(&confidence) {
            return Err(PayloadError::Confidence(confidence));
        }

        let in_frame = landmarks.iter().all(Landmark::in_unit_square);

        Ok(Self {
            handedness,
            confidence,
            in_frame,
            landmarks,
            world_landmarks,
        })
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    pub fn landmarks(&self) -> &[Landmark; NUM_LANDMARKS] {
        &self.landmarks
    }

    pub fn world_landmarks(&self) -> &[Landmark; NUM_LANDMARKS] {
        &self.world_landmarks
    }

    /// Metric distance between two world landmarks
    ///
    /// Panics if either index is not below [`NUM_LANDMARKS`].
    pub fn world_distance(&self, a: usize, b: usize) -> f32 {
        self.world_landmarks[a].distance(&self.world_landmarks[b])
    }

    /// Image-relative distance between two normalized landmarks
    pub fn normalized_distance(&self, a: usize, b: usize) -> f32 {
        self.landmarks[a].distance(&self.landmarks[b])
    }

    /// True when the two world landmarks are closer than `threshold`
    pub fn is_pinching(&self, a: usize, b: usize, threshold: f32) -> bool {
        self.world_distance(a, b) < threshold
    }
}

fn to_array(
    points: &[Landmark],
    kind: &'static str,
) -> Result<[Landmark; NUM_LANDMARKS], PayloadError> {
    points.try_into().map_err(|_| PayloadError::LandmarkCount {
        kind,
        expected: NUM_LANDMARKS,
        got: points.len(),
    })
}

/// Frame-level metadata
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Meta {
    /// Nanoseconds since loop start
    pub timestamp_ns: u64,
    pub width: u32,
    pub height: u32,
    /// Reciprocal of the inter-frame delta, 0 when the delta is zero
    pub fps_estimate: f32,
}

impl Meta {
    pub fn new(timestamp_ns: u64, width: u32, height: u32, delta_ns: u64) -> Result<Self, PayloadError> {
        if width == 0 || height == 0 {
            return Err(PayloadError::FrameSize { width, height });
        }
        let fps_estimate = if delta_ns > 0 {
            (1e9 / delta_ns as f64) as f32
        } else {
            0.0
        };
        Ok(Self {
            timestamp_ns,
            width,
            height,
            fps_estimate,
        })
    }

    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1e9
    }
}

/// Everything the interfaces see for one frame
#[derive(Clone, Debug, PartialEq)]
pub struct FramePayload {
    meta: Meta,
    hands: Vec<Hand>,
}

impl FramePayload {
    pub fn new(meta: Meta, hands: Vec<Hand>) -> Self {
        Self { meta, hands }
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Hands in the order the detector delivered them
    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    pub fn has_hands(&self) -> bool {
        !self.hands.is_empty()
    }
}
