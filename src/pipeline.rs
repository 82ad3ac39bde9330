//! Frame loop: detection → payload → interfaces

use crate::adapters::SharedSerial;
use crate::manager::InterfaceManager;
use crate::payload_builder::PayloadBuilder;
use crate::source::DetectionSource;
use crate::stats::{FrameStats, Timer};
use crate::time_controller::{frame_interval_secs, TimeController};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

/// Drive the manager until the source ends or `running` is cleared.
///
/// Frames that fail to build are skipped. An interface failure halts the
/// loop after the rest of that frame's fan-out has completed.
pub fn run_pipeline(
    source: &mut dyn DetectionSource,
    manager: &mut InterfaceManager,
    target_fps: f64,
    running: &AtomicBool,
    stats: &mut FrameStats,
) -> Result<()> {
    let interval = frame_interval_secs(target_fps);
    let mut clock = TimeController::new();
    clock.start();

    info!(
        "[pipeline] Running with {:?} at {} fps target",
        manager.active_ids(),
        target_fps
    );

    while running.load(Ordering::SeqCst) {
        clock.update(interval);
        let mut timer = Timer::new();

        let Some(detection) = source.next_detection()? else {
            info!("[pipeline] Input ended");
            break;
        };

        let payload = match PayloadBuilder::build(&detection, clock.elapsed_ns(), clock.delta_ns()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("[pipeline] Skipping frame at {:.3}s: {}", clock.elapsed_secs(), e);
                stats.skipped += 1;
                continue;
            }
        };
        timer.set_hands(payload.hands().len());

        match manager.on_frame(&payload) {
            Ok(dispatched) => {
                debug!("[pipeline] Frame dispatched to {} interfaces", dispatched);
                timer.finish(stats, dispatched);
            }
            Err(e) => {
                stats.failed += 1;
                return Err(e).context(format!(
                    "Frame loop halted at {:.3}s",
                    clock.elapsed_secs()
                ));
            }
        }
    }

    Ok(())
}

/// Release the serial link after the loop. A close failure is only logged so
/// it never hides the loop's own result.
pub fn shutdown(serial: Option<&SharedSerial>, result: Result<()>) -> Result<()> {
    if let Some(serial) = serial {
        if let Err(e) = serial.borrow_mut().close() {
            warn!("[pipeline] Failed to close serial port: {}", e);
        }
    }
    result
}
