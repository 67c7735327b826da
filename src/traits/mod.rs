//! Trait definitions for hardware and vision collaborators.
//!
//! This module defines the seams that let trackbot:
//! - Run against any GPIO backend (or desktop mocks)
//! - Treat the camera and detection pipeline as black boxes
//!
//! # Submodules
//!
//! - `hardware`: GPIO line access and drive direction
//! - `vision`: Frame source and object detector collaborators
//!
//! The key traits are:
//!
//! - [`DigitalLine`]: One settable/readable GPIO pin
//! - [`FrameSource`]: Blocking camera frame acquisition
//! - [`Detector`]: Per-frame object detection

pub mod hardware;
pub mod vision;

pub use hardware::*;
pub use vision::*;
