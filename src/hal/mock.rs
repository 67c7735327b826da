//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware and vision
//! traits, enabling development and testing on desktop without a robot
//! attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockLine`] | [`DigitalLine`] | Records writes, scriptable reads and faults |
//! | [`MockFrameSource`] | [`FrameSource`] | Queued frames |
//! | [`MockDetector`] | [`Detector`] | Scripted per-frame detections |
//!
//! [`MockLine`] clones share state, so a test can keep a probe handle
//! to a line whose other handle has moved into a PWM timing thread or
//! the tracking task:
//!
//! ```rust
//! use trackbot::hal::MockLine;
//! use trackbot::PwmChannel;
//!
//! let line = MockLine::new();
//! let probe = line.clone();
//!
//! let mut pwm = PwmChannel::start(line, 500, 100);
//! std::thread::sleep(std::time::Duration::from_millis(5));
//! assert!(probe.high_count() > 0);
//! pwm.stop().unwrap();
//! ```
//!
//! [`DigitalLine`]: crate::traits::DigitalLine
//! [`FrameSource`]: crate::traits::FrameSource
//! [`Detector`]: crate::traits::Detector

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::label;
use crate::traits::{BoundingBox, Detection, Detector, DigitalLine, Frame, FrameSource};

// ============================================================================
// Digital line
// ============================================================================

#[derive(Debug)]
struct LineInner {
    level: bool,
    high_count: usize,
    low_count: usize,
    fail_writes: bool,
    fail_reads: bool,
    history: Vec<(Instant, bool)>,
}

/// Mock GPIO line for testing.
///
/// Clones share one underlying state. One handle plays the hardware
/// line (moved into the code under test), the others stay behind as
/// probes to script inputs and inspect writes.
///
/// # Example
///
/// ```rust
/// use trackbot::hal::MockLine;
/// use trackbot::traits::DigitalLine;
///
/// let mut line = MockLine::new();
/// let probe = line.clone();
///
/// line.set_high().unwrap();
/// assert!(probe.is_high());
/// assert_eq!(probe.high_count(), 1);
///
/// probe.set_input(false);
/// assert_eq!(line.read().unwrap(), false);
/// ```
#[derive(Clone, Debug)]
pub struct MockLine {
    inner: Arc<Mutex<LineInner>>,
}

impl MockLine {
    /// Creates a new line, initially low.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LineInner {
                level: false,
                high_count: 0,
                low_count: 0,
                fail_writes: false,
                fail_reads: false,
                history: vec![(Instant::now(), false)],
            })),
        }
    }

    /// Sets the level that [`DigitalLine::read`] reports.
    pub fn set_input(&self, high: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.level = high;
        inner.history.push((Instant::now(), high));
    }

    /// Current line level.
    pub fn is_high(&self) -> bool {
        self.inner.lock().unwrap().level
    }

    /// Number of successful `set_high` calls.
    pub fn high_count(&self) -> usize {
        self.inner.lock().unwrap().high_count
    }

    /// Number of successful `set_low` calls.
    pub fn low_count(&self) -> usize {
        self.inner.lock().unwrap().low_count
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    /// Makes subsequent reads fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    /// Fraction of time the line has spent high since creation,
    /// time-weighted over the recorded level changes.
    pub fn high_fraction(&self) -> f64 {
        let inner = self.inner.lock().unwrap();
        let now = Instant::now();
        let first = match inner.history.first() {
            Some((at, _)) => *at,
            None => return 0.0,
        };
        let total = now.duration_since(first).as_secs_f64();
        if total <= 0.0 {
            return 0.0;
        }

        let mut high = 0.0;
        for pair in inner.history.windows(2) {
            if pair[0].1 {
                high += pair[1].0.duration_since(pair[0].0).as_secs_f64();
            }
        }
        if let Some((at, level)) = inner.history.last() {
            if *level {
                high += now.duration_since(*at).as_secs_f64();
            }
        }
        high / total
    }

    fn write(&mut self, high: bool) -> Result<(), ()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(());
        }
        inner.level = high;
        if high {
            inner.high_count += 1;
        } else {
            inner.low_count += 1;
        }
        inner.history.push((Instant::now(), high));
        Ok(())
    }
}

impl Default for MockLine {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalLine for MockLine {
    type Error = ();

    fn set_high(&mut self) -> Result<(), ()> {
        self.write(true)
    }

    fn set_low(&mut self) -> Result<(), ()> {
        self.write(false)
    }

    fn read(&self) -> Result<bool, ()> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            return Err(());
        }
        Ok(inner.level)
    }
}

// ============================================================================
// Vision mocks
// ============================================================================

/// Mock frame source with a queue of prepared frames.
///
/// [`capture`](FrameSource::capture) pops the queue front; an empty
/// queue is a capture fault, which lets tests exercise the aborted
/// search path by simply under-filling the queue.
#[derive(Debug, Default)]
pub struct MockFrameSource {
    queue: VecDeque<Frame>,
    next_seq: u64,
}

impl MockFrameSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one prepared frame.
    pub fn queue_frame(&mut self, frame: Frame) {
        self.next_seq = self.next_seq.max(frame.seq + 1);
        self.queue.push_back(frame);
    }

    /// Queues `count` empty frames with consecutive sequence numbers.
    pub fn queue_blank_frames(&mut self, count: usize) {
        for _ in 0..count {
            let frame = Frame::new(self.next_seq, 0, 0, Vec::new());
            self.next_seq += 1;
            self.queue.push_back(frame);
        }
    }

    /// Frames left in the queue.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl FrameSource for MockFrameSource {
    type Error = ();

    fn capture(&mut self) -> Result<Frame, ()> {
        self.queue.pop_front().ok_or(())
    }
}

/// Mock detector replaying a per-frame script.
///
/// Each [`detect`](Detector::detect) call consumes the next scripted
/// detection set; once the script runs out, every frame detects
/// nothing. [`set_fail`](Self::set_fail) switches the detector to
/// returning errors instead.
#[derive(Debug, Default)]
pub struct MockDetector {
    script: VecDeque<Vec<Detection>>,
    fail: bool,
    /// Number of `detect` calls made.
    pub call_count: usize,
}

impl MockDetector {
    /// Creates a detector with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the detections for the next unscripted frame, one
    /// detection per label.
    pub fn push_frame_labels(&mut self, labels: &[&str]) {
        let detections = labels
            .iter()
            .map(|name| Detection {
                label: label(name),
                confidence: 0.9,
                bbox: BoundingBox::default(),
            })
            .collect();
        self.script.push_back(detections);
    }

    /// Makes subsequent `detect` calls fail (or succeed again).
    pub fn set_fail(&mut self, fail: bool) {
        self.fail = fail;
    }
}

impl Detector for MockDetector {
    type Error = ();

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, ()> {
        if self.fail {
            return Err(());
        }
        self.call_count += 1;
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn mock_line_records_writes() {
        let mut line = MockLine::new();
        assert!(!line.is_high());

        line.set_high().unwrap();
        line.set_low().unwrap();
        line.set_high().unwrap();

        assert!(line.is_high());
        assert_eq!(line.high_count(), 2);
        assert_eq!(line.low_count(), 1);
    }

    #[test]
    fn mock_line_clones_share_state() {
        let mut line = MockLine::new();
        let probe = line.clone();

        probe.set_input(true);
        assert_eq!(line.read().unwrap(), true);

        line.set_low().unwrap();
        assert!(!probe.is_high());
        assert_eq!(probe.low_count(), 1);
    }

    #[test]
    fn mock_line_write_faults_do_not_count() {
        let mut line = MockLine::new();
        line.fail_writes(true);
        assert!(line.set_high().is_err());
        assert_eq!(line.high_count(), 0);
        assert!(!line.is_high());

        line.fail_writes(false);
        line.set_high().unwrap();
        assert_eq!(line.high_count(), 1);
    }

    #[test]
    fn mock_line_read_faults() {
        let line = MockLine::new();
        line.fail_reads(true);
        assert!(line.read().is_err());
        line.fail_reads(false);
        assert!(line.read().is_ok());
    }

    #[test]
    fn mock_line_high_fraction_tracks_level() {
        let mut line = MockLine::new();
        thread::sleep(Duration::from_millis(20));
        line.set_high().unwrap();
        thread::sleep(Duration::from_millis(20));
        line.set_low().unwrap();

        let fraction = line.high_fraction();
        assert!(fraction > 0.2 && fraction < 0.8, "fraction {fraction}");
    }

    #[test]
    fn mock_frame_source_sequences_and_exhausts() {
        let mut frames = MockFrameSource::new();
        frames.queue_blank_frames(2);
        assert_eq!(frames.remaining(), 2);

        assert_eq!(frames.capture().unwrap().seq, 0);
        assert_eq!(frames.capture().unwrap().seq, 1);
        assert!(frames.capture().is_err());
    }

    #[test]
    fn mock_frame_source_continues_after_queued_frame() {
        let mut frames = MockFrameSource::new();
        frames.queue_frame(Frame::new(9, 640, 480, Vec::new()));
        frames.queue_blank_frames(1);

        assert_eq!(frames.capture().unwrap().seq, 9);
        assert_eq!(frames.capture().unwrap().seq, 10);
    }

    #[test]
    fn mock_detector_replays_script_then_empties() {
        let mut detector = MockDetector::new();
        detector.push_frame_labels(&["hammer", "pliers"]);

        let frame = Frame::default();
        let first = detector.detect(&frame).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].label.as_str(), "hammer");

        assert!(detector.detect(&frame).unwrap().is_empty());
        assert_eq!(detector.call_count, 2);
    }

    #[test]
    fn mock_detector_failure_mode() {
        let mut detector = MockDetector::new();
        detector.set_fail(true);
        assert!(detector.detect(&Frame::default()).is_err());
    }
}
