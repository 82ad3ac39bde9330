//! Detector output → [`FramePayload`]

use crate::payload::{FramePayload, Hand, Landmark, Meta, PayloadError};
use crate::source::{DetectedHand, Detection};

pub struct PayloadBuilder;

impl PayloadBuilder {
    /// Build the payload for one frame.
    ///
    /// Any malformed hand fails the whole frame; nothing is partially built.
    pub fn build(
        detection: &Detection,
        timestamp_ns: u64,
        delta_ns: u64,
    ) -> Result<FramePayload, PayloadError> {
        let meta = Meta::new(timestamp_ns, detection.width, detection.height, delta_ns)?;
        let hands = detection
            .hands
            .iter()
            .map(Self::build_hand)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FramePayload::new(meta, hands))
    }

    fn build_hand(detected: &DetectedHand) -> Result<Hand, PayloadError> {
        let landmarks: Vec<Landmark> = detected.landmarks.iter().copied().map(Landmark::from).collect();
        let world: Vec<Landmark> = detected
            .world_landmarks
            .iter()
            .copied()
            .map(Landmark::from)
            .collect();
        Hand::new(detected.handedness, detected.score, &landmarks, &world)
    }
}
