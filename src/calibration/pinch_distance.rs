use crate::payload::{FramePayload, Hand};
use log::{debug, warn};

/// Collects single-hand frames over a time window and averages the world
/// distance between two landmarks
#[derive(Debug, Clone, Default)]
pub struct PinchDistanceCalibration {
    samples: Vec<Hand>,
    start_secs: f64,
    current_secs: f64,
}

impl PinchDistanceCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the frame if it holds exactly one hand. Returns whether it was kept.
    pub fn add_frame(&mut self, payload: &FramePayload) -> bool {
        let hand = match payload.hands() {
            [] => {
                warn!("[calibration] No hands detected, rejecting frame");
                return false;
            }
            [hand] => hand,
            hands => {
                warn!(
                    "[calibration] {} hands detected, rejecting frame",
                    hands.len()
                );
                return false;
            }
        };

        let now = payload.meta().timestamp_secs();
        if self.samples.is_empty() {
            self.start_secs = now;
        }
        self.current_secs = now;
        self.samples.push(hand.clone());
        true
    }

    /// Seconds between the first and the latest accepted frame
    pub fn elapsed(&self) -> f64 {
        self.current_secs - self.start_secs
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// World distance between landmarks `i` and `j` of one hand
    pub fn distance(hand: &Hand, i: usize, j: usize) -> f32 {
        hand.world_distance(i, j)
    }

    /// Distance in the most recently accepted frame
    pub fn last_distance(&self, i: usize, j: usize) -> Option<f32> {
        self.samples.last().map(|hand| Self::distance(hand, i, j))
    }

    /// Mean distance over all accepted frames, 0 when none were accepted
    pub fn average_distance(&self, i: usize, j: usize) -> f32 {
        if self.samples.is_empty() {
            debug!("[calibration] No frames available");
            return 0.0;
        }
        let total: f32 = self
            .samples
            .iter()
            .map(|hand| Self::distance(hand, i, j))
            .sum();
        total / self.samples.len() as f32
    }
}
