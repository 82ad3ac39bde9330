//! Detection input: one JSON object per line from the hand-landmark detector
//!
//! ```text
//! {"width":640,"height":480,"hands":[{"handedness":"Right","score":0.97,
//!   "landmarks":[[x,y,z], ...21],"world_landmarks":[[x,y,z], ...21]}]}
//! ```
//!
//! Landmarks may also be written as `{"x":..,"y":..,"z":..}` objects. Blank
//! lines and the detector's `READY` banner are skipped.

use crate::payload::{Handedness, Landmark};
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

const READY_BANNER: &str = "READY";

/// One landmark as the detector writes it
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Point {
    Array([f32; 3]),
    Object { x: f32, y: f32, z: f32 },
}

impl From<Point> for Landmark {
    fn from(point: Point) -> Self {
        match point {
            Point::Array(xyz) => Landmark::from(xyz),
            Point::Object { x, y, z } => Landmark::new(x, y, z),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DetectedHand {
    pub handedness: Handedness,
    #[serde(alias = "confidence")]
    pub score: f32,
    pub landmarks: Vec<Point>,
    pub world_landmarks: Vec<Point>,
}

/// Raw detector output for one frame
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Detection {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub hands: Vec<DetectedHand>,
    /// Set by the detector when inference failed for this frame
    #[serde(default)]
    pub error: Option<String>,
}

/// Anything that yields detections frame by frame
pub trait DetectionSource {
    /// Next detection, or `None` once the stream has ended
    fn next_detection(&mut self) -> Result<Option<Detection>>;
}

/// Reads JSON-lines detections from any buffered reader, optionally owning
/// the detector process that produces them
pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    line_number: usize,
    child: Option<Child>,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            child: None,
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open detection input {:?}", path))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl JsonLinesSource<BufReader<ChildStdout>> {
    /// Start a detector subprocess and read its stdout
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        info!("[source] Starting detector: {} {}", program, args.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to start detector '{}'", program))?;
        let stdout = child.stdout.take().context("Failed to get detector stdout")?;

        let mut source = Self::new(BufReader::new(stdout));
        source.child = Some(child);
        Ok(source)
    }
}

impl<R: BufRead> DetectionSource for JsonLinesSource<R> {
    fn next_detection(&mut self) -> Result<Option<Detection>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == READY_BANNER {
                info!("[source] Detector ready");
                continue;
            }

            let detection: Detection = serde_json::from_str(trimmed)
                .with_context(|| format!("Invalid detection on line {}", self.line_number))?;
            if let Some(err) = &detection.error {
                warn!("[source] Detector error on line {}: {}", self.line_number, err);
            }
            return Ok(Some(detection));
        }
    }
}

impl<R: BufRead> Drop for JsonLinesSource<R> {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Open `-` (stdin) or a file path as a detection source
pub fn open_input(input: &str) -> Result<Box<dyn DetectionSource>> {
    if input == "-" {
        Ok(Box::new(JsonLinesSource::new(io::stdin().lock())))
    } else {
        Ok(Box::new(JsonLinesSource::open(input)?))
    }
}
