//! Frame loop timing stats

use std::time::{Duration, Instant};

#[derive(Clone, Default, Debug)]
pub struct FrameStats {
    pub frames: Vec<FrameSample>,
    /// Frames dropped because the payload could not be built
    pub skipped: usize,
    /// Frames where at least one interface failed
    pub failed: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct FrameSample {
    pub duration: Duration,
    pub hands: usize,
    pub dispatched: usize,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: FrameSample) {
        self.frames.push(sample);
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();

        if !self.frames.is_empty() {
            let (avg, min, max, total) = Self::calc(&self.frames);
            let fps = if total.is_zero() {
                0.0
            } else {
                self.frames.len() as f64 / total.as_secs_f64()
            };
            let with_hands = self.frames.iter().filter(|s| s.hands > 0).count();
            out.push_str(&format!(
                "Frames (n={}): avg={:.1}ms min={:.1}ms max={:.1}ms total={:.1}s ~{:.1} fps, hands in {}\n",
                self.frames.len(),
                avg.as_secs_f64() * 1000.0,
                min.as_secs_f64() * 1000.0,
                max.as_secs_f64() * 1000.0,
                total.as_secs_f64(),
                fps,
                with_hands
            ));
        }

        if self.skipped > 0 || self.failed > 0 {
            out.push_str(&format!(
                "Skipped frames: {}, failed frames: {}\n",
                self.skipped, self.failed
            ));
        }

        if out.is_empty() {
            out.push_str("No frames processed.\n");
        }
        out
    }

    fn calc(samples: &[FrameSample]) -> (Duration, Duration, Duration, Duration) {
        let total: Duration = samples.iter().map(|s| s.duration).sum();
        let avg = total / samples.len() as u32;
        let min = samples.iter().map(|s| s.duration).min().unwrap_or_default();
        let max = samples.iter().map(|s| s.duration).max().unwrap_or_default();
        (avg, min, max, total)
    }
}

/// Measures one frame from acquisition to the end of dispatch
pub struct Timer {
    start: Instant,
    hands: usize,
}

impl Timer {
    pub fn new() -> Self {
        Self { start: Instant::now(), hands: 0 }
    }

    pub fn set_hands(&mut self, hands: usize) {
        self.hands = hands;
    }

    pub fn finish(self, stats: &mut FrameStats, dispatched: usize) {
        stats.record(FrameSample {
            duration: self.start.elapsed(),
            hands: self.hands,
            dispatched,
        });
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
