//! Synthetic hands and recording adapters for unit tests

use crate::adapters::{
    AdapterError, ButtonAction, CursorAdapter, MouseButton, PointerBackend, SerialAdapter,
    SharedCursor, SharedSerial,
};
use crate::payload::{landmarks, FramePayload, Hand, Handedness, Landmark, Meta, NUM_LANDMARKS};
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;

// ============================================================================
// Hands and payloads
// ============================================================================

pub fn flat_landmarks(v: f32) -> Vec<Landmark> {
    vec![Landmark::new(v, v, v); NUM_LANDMARKS]
}

/// World landmarks with the thumb tip at the origin and each fingertip
/// (index, middle, ring, pinky) at the given distance along its own axis.
pub fn world_with_tip_distances(distances: [f32; 4]) -> Vec<Landmark> {
    let mut world = vec![Landmark::new(0.2, 0.2, 0.2); NUM_LANDMARKS];
    world[landmarks::THUMB_TIP] = Landmark::new(0.0, 0.0, 0.0);
    world[landmarks::INDEX_FINGER_TIP] = Landmark::new(distances[0], 0.0, 0.0);
    world[landmarks::MIDDLE_FINGER_TIP] = Landmark::new(0.0, distances[1], 0.0);
    world[landmarks::RING_FINGER_TIP] = Landmark::new(0.0, 0.0, distances[2]);
    world[landmarks::PINKY_TIP] = Landmark::new(-distances[3], 0.0, 0.0);
    world
}

/// Hand whose tracker (index tip) sits at `(x, y)` in image space
pub fn hand_at(handedness: Handedness, x: f32, y: f32, distances: [f32; 4]) -> Hand {
    let mut normalized = flat_landmarks(0.5);
    normalized[landmarks::INDEX_FINGER_TIP] = Landmark::new(x, y, 0.0);
    Hand::new(handedness, 0.9, &normalized, &world_with_tip_distances(distances))
        .expect("valid synthetic hand")
}

/// Hand with only the thumb-index distance set; other fingers are far apart
pub fn hand_with_pinch(handedness: Handedness, thumb_index: f32) -> Hand {
    hand_at(handedness, 0.5, 0.5, [thumb_index, 0.1, 0.1, 0.1])
}

pub fn payload(hands: Vec<Hand>) -> FramePayload {
    payload_at(0, hands)
}

pub fn payload_at(timestamp_ns: u64, hands: Vec<Hand>) -> FramePayload {
    let meta = Meta::new(timestamp_ns, 640, 480, 33_333_333).expect("valid meta");
    FramePayload::new(meta, hands)
}

/// One JSON detection line with a hand per `(handedness, thumb-index distance)`
pub fn detection_line(hands: &[(Handedness, f32)]) -> String {
    let points = |lms: &[Landmark]| {
        lms.iter()
            .map(|l| format!("[{},{},{}]", l.x, l.y, l.z))
            .collect::<Vec<_>>()
            .join(",")
    };
    let hands: Vec<String> = hands
        .iter()
        .map(|(handedness, d)| {
            format!(
                r#"{{"handedness":"{}","score":0.9,"landmarks":[{}],"world_landmarks":[{}]}}"#,
                handedness,
                points(&flat_landmarks(0.5)),
                points(&world_with_tip_distances([*d, 0.1, 0.1, 0.1]))
            )
        })
        .collect();
    format!(r#"{{"width":640,"height":480,"hands":[{}]}}"#, hands.join(","))
}

// ============================================================================
// Recording pointer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Move(i32, i32),
    Button(MouseButton, ButtonAction),
    Scroll(i32, i32),
}

pub type PointerLog = Rc<RefCell<Vec<PointerEvent>>>;

pub struct RecordingPointer {
    size: (u32, u32),
    events: PointerLog,
}

impl RecordingPointer {
    pub fn new(width: u32, height: u32) -> (Self, PointerLog) {
        let events = PointerLog::default();
        (
            Self {
                size: (width, height),
                events: Rc::clone(&events),
            },
            events,
        )
    }
}

impl PointerBackend for RecordingPointer {
    fn screen_size(&self) -> Result<(u32, u32), AdapterError> {
        Ok(self.size)
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<(), AdapterError> {
        self.events.borrow_mut().push(PointerEvent::Move(x, y));
        Ok(())
    }

    fn button(&mut self, button: MouseButton, action: ButtonAction) -> Result<(), AdapterError> {
        self.events.borrow_mut().push(PointerEvent::Button(button, action));
        Ok(())
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), AdapterError> {
        self.events.borrow_mut().push(PointerEvent::Scroll(dx, dy));
        Ok(())
    }
}

pub fn recording_cursor() -> (SharedCursor, PointerLog) {
    let (pointer, events) = RecordingPointer::new(1000, 1000);
    let cursor = CursorAdapter::new(Box::new(pointer)).expect("valid screen");
    (cursor.shared(), events)
}

// ============================================================================
// Recording serial
// ============================================================================

pub type ByteLog = Rc<RefCell<Vec<u8>>>;

/// Serial stream that replays `input` on read and records every write
pub struct LoopbackStream {
    input: io::Cursor<Vec<u8>>,
    written: ByteLog,
}

impl LoopbackStream {
    pub fn new(input: &str) -> (Self, ByteLog) {
        let written = ByteLog::default();
        (
            Self {
                input: io::Cursor::new(input.as_bytes().to_vec()),
                written: Rc::clone(&written),
            },
            written,
        )
    }
}

impl Read for LoopbackStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for LoopbackStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn recording_serial() -> (SharedSerial, ByteLog) {
    let (stream, written) = LoopbackStream::new("");
    (SerialAdapter::with_stream("ESP32", Box::new(stream)).shared(), written)
}

pub fn written_lines(log: &ByteLog) -> Vec<String> {
    String::from_utf8_lossy(&log.borrow())
        .lines()
        .map(String::from)
        .collect()
}
