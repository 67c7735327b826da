//! Vision collaborator traits: frame acquisition and object detection.
//!
//! The detection pipeline itself (model format, pre/post-processing,
//! inference runtime) is an external collaborator. This module only
//! fixes the seam the search session depends on: a source of frames
//! and a per-frame detector producing labeled detections with no
//! ordering guarantee.
//!
//! # Example
//!
//! ```rust
//! use trackbot::traits::{Detector, FrameSource};
//! use trackbot::hal::{MockDetector, MockFrameSource};
//!
//! let mut frames = MockFrameSource::new();
//! frames.queue_blank_frames(1);
//!
//! let mut detector = MockDetector::new();
//! detector.push_frame_labels(&["hammer", "pliers"]);
//!
//! let frame = frames.capture().unwrap();
//! let detections = detector.detect(&frame).unwrap();
//! assert_eq!(detections.len(), 2);
//! ```

use core::fmt;

use crate::config::Label;

/// One captured camera frame.
///
/// Carries enough to identify and redisplay the frame; the pixel buffer
/// is opaque to this crate.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Monotonic capture sequence number.
    pub seq: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw pixel data, format defined by the frame source.
    pub data: Vec<u8>,
}

impl Frame {
    /// Creates a frame from its parts.
    pub fn new(seq: u64, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            seq,
            width,
            height,
            data,
        }
    }
}

/// Axis-aligned detection bounding box, in frame pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
}

/// A single object detection in one frame.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Detection {
    /// Class label, e.g. `"hammer"`.
    pub label: Label,
    /// Detector confidence, 0.0 to 1.0.
    pub confidence: f32,
    /// Location of the detection in the frame.
    pub bbox: BoundingBox,
}

/// Source of camera frames.
///
/// A capture failure terminates the foreground search as aborted; the
/// session reports failure with no result frame.
pub trait FrameSource {
    /// Error type for capture failures.
    type Error: fmt::Debug;

    /// Acquire the next frame, blocking until one is available.
    fn capture(&mut self) -> Result<Frame, Self::Error>;
}

/// Per-frame object detector.
///
/// May return an empty set; the detection order is not meaningful.
pub trait Detector {
    /// Error type for detection failures.
    type Error: fmt::Debug;

    /// Run detection on one frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error>;
}
