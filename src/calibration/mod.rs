//! Person-specific thresholds derived from observed hands

mod pinch_distance;

pub use pinch_distance::PinchDistanceCalibration;

use crate::payload_builder::PayloadBuilder;
use crate::source::DetectionSource;
use crate::time_controller::TimeController;
use crate::payload::NUM_LANDMARKS;
use anyhow::{ensure, Result};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

/// Suggested pinch threshold as a multiple of the measured pinch distance
const THRESHOLD_MARGIN: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    pub average_distance: f32,
    pub samples: usize,
    pub elapsed_secs: f64,
}

impl CalibrationResult {
    /// Threshold a little above the measured pinch so a relaxed pinch still counts
    pub fn suggested_threshold(&self) -> f32 {
        self.average_distance * THRESHOLD_MARGIN
    }
}

/// Sample the distance between landmarks `first` and `second` while the user
/// pinches repeatedly.
///
/// Stops once `duration_secs` of accepted frames have been collected, the
/// source ends, or `running` is cleared. Fails before reading any input when
/// either landmark index is out of range.
pub fn calibrate_pinch_distance(
    source: &mut dyn DetectionSource,
    first: usize,
    second: usize,
    duration_secs: f64,
    target_interval_secs: f64,
    running: &AtomicBool,
) -> Result<CalibrationResult> {
    ensure!(
        first < NUM_LANDMARKS && second < NUM_LANDMARKS,
        "landmark indices {} and {} must be below {}",
        first,
        second,
        NUM_LANDMARKS
    );

    let mut calibration = PinchDistanceCalibration::new();
    let mut clock = TimeController::new();
    clock.start();

    info!("[calibration] Started, pinch with one hand in view");

    while running.load(Ordering::SeqCst) {
        clock.update(target_interval_secs);

        let Some(detection) = source.next_detection()? else {
            info!("[calibration] Input ended");
            break;
        };
        let payload = match PayloadBuilder::build(&detection, clock.elapsed_ns(), clock.delta_ns()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("[calibration] Skipping frame: {}", e);
                continue;
            }
        };

        if calibration.add_frame(&payload) {
            if let Some(distance) = calibration.last_distance(first, second) {
                debug!(
                    "[calibration] Elapsed {:.2}s, distance {:.4}",
                    calibration.elapsed(),
                    distance
                );
            }
            if calibration.elapsed() >= duration_secs {
                break;
            }
        }
    }

    let result = CalibrationResult {
        average_distance: calibration.average_distance(first, second),
        samples: calibration.sample_count(),
        elapsed_secs: calibration.elapsed(),
    };
    info!(
        "[calibration] Completed: average distance between {} and {} is {:.4} over {} frames",
        first, second, result.average_distance, result.samples
    );
    Ok(result)
}
