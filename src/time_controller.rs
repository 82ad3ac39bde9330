//! Frame clock: elapsed/delta time and soft pacing toward a target interval

use std::thread;
use std::time::{Duration, Instant};

/// Interval between frames for a target rate; 0 disables pacing
pub fn frame_interval_secs(target_fps: f64) -> f64 {
    if target_fps > 0.0 { 1.0 / target_fps } else { 0.0 }
}

/// How long to sleep so the next frame lands one `target` after `previous`.
/// Never negative, never more than one interval.
pub fn pacing_delay(previous: Duration, target_secs: f64, current: Duration) -> Duration {
    if target_secs.is_nan() || target_secs <= 0.0 {
        return Duration::ZERO;
    }
    let Ok(target) = Duration::try_from_secs_f64(target_secs) else {
        return Duration::ZERO;
    };
    (previous + target).saturating_sub(current).min(target)
}

#[derive(Debug, Clone, Default)]
pub struct TimeController {
    start: Option<Instant>,
    elapsed: Duration,
    delta: Duration,
}

impl TimeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the reference start time. Later calls keep the first one.
    pub fn start(&mut self) {
        if self.start.is_none() {
            self.start = Some(Instant::now());
        }
    }

    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }

    /// Advance the clock, first sleeping up to `target_interval_secs` so frames
    /// arrive at a steady cadence. Starts the clock if `start` was never called.
    pub fn update(&mut self, target_interval_secs: f64) {
        let start = *self.start.get_or_insert_with(Instant::now);

        let delay = pacing_delay(self.elapsed, target_interval_secs, start.elapsed());
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let elapsed = start.elapsed();
        self.delta = elapsed.saturating_sub(self.elapsed);
        self.elapsed = elapsed;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_ns(&self) -> u64 {
        duration_ns(self.elapsed)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_ns(&self) -> u64 {
        duration_ns(self.delta)
    }

    pub fn delta_secs(&self) -> f64 {
        self.delta.as_secs_f64()
    }
}

fn duration_ns(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacing_delay() {
        let ms = Duration::from_millis;
        // 10ms into a 33ms frame: wait the rest
        assert_eq!(pacing_delay(ms(100), 0.033, ms(110)), ms(23));
        // overrun: no wait, no catch-up
        assert_eq!(pacing_delay(ms(100), 0.033, ms(200)), Duration::ZERO);
        // pacing disabled
        assert_eq!(pacing_delay(ms(100), 0.0, ms(100)), Duration::ZERO);
        assert_eq!(pacing_delay(ms(100), -1.0, ms(100)), Duration::ZERO);
        assert_eq!(pacing_delay(ms(100), f64::NAN, ms(100)), Duration::ZERO);
    }

    #[test]
    fn test_pacing_delay_bounded_by_interval() {
        let delay = pacing_delay(Duration::from_secs(5), 0.05, Duration::from_secs(1));
        assert_eq!(delay, Duration::from_millis(50));
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(frame_interval_secs(0.0), 0.0);
        assert!((frame_interval_secs(20.0) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_unstarted_is_zero() {
        let clock = TimeController::new();
        assert!(!clock.is_started());
        assert_eq!(clock.elapsed_ns(), 0);
        assert_eq!(clock.delta_ns(), 0);
    }

    #[test]
    fn test_update_paces_and_accumulates() {
        let mut clock = TimeController::new();
        clock.start();

        clock.update(0.01);
        let first = clock.elapsed();
        assert!(first >= Duration::from_millis(10));

        clock.update(0.01);
        assert!(clock.elapsed() >= first + Duration::from_millis(10));
        assert!(clock.delta() >= Duration::from_millis(10));
        assert_eq!(clock.delta_ns(), duration_ns(clock.elapsed() - first));
    }

    #[test]
    fn test_start_is_sticky() {
        let mut clock = TimeController::new();
        clock.start();
        clock.update(0.005);
        let before = clock.elapsed();
        clock.start();
        clock.update(0.0);
        assert!(clock.elapsed() >= before);
    }
}
