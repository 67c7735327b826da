//! # trackbot
//!
//! The concurrent motion-control subsystem of a line-following rover:
//! software PWM speed control, differential drive primitives, the
//! line-tracking policy, and the session orchestrator that keeps the
//! robot on its line while a vision search runs in the foreground.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for GPIO lines, frame capture, and object detection
//! - **Software PWM**: One timing thread per motor, tear-free duty updates, line forced low on every exit path
//! - **Differential drive**: Per-motor or all-motor primitives with a both-lines-high safety invariant
//! - **Line-tracking policy**: Pure first-match rule table over a four-sensor snapshot
//! - **Cancellable sessions**: Background tracking task joined before any result surfaces
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and vision abstractions
//! - `pwm` - Software PWM timing threads
//! - `drive` - Differential drive unit over H-bridge lines
//! - `sensors` / `policy` - Line-sensor snapshots and the steering rule table
//! - `tracking` - The cancellable background line-tracking task
//! - `confirm` / `session` - Detection debouncing and the search orchestrator
//! - `speech` - Voice-command line parsing
//! - `hal` - Mock implementations for testing
//!
//! ## Example
//!
//! ```rust
//! use trackbot::{
//!     hal::{MockDetector, MockFrameSource, MockLine},
//!     CancellationToken, Config, DriveUnit, PwmChannel, Rover, SensorArray,
//! };
//!
//! let mk = || MockLine::new();
//! let no_line = || {
//!     let line = MockLine::new();
//!     line.set_input(true); // active-low sensors idle high
//!     line
//! };
//!
//! let config = Config::default();
//! let pwm_a = PwmChannel::start(mk(), config.pwm.frequency_hz, 0);
//! let pwm_b = PwmChannel::start(mk(), config.pwm.frequency_hz, 0);
//! let drive = DriveUnit::new((mk(), mk()), (mk(), mk()), pwm_a, pwm_b, 30);
//! let sensors = SensorArray::new(no_line(), no_line(), no_line(), no_line());
//!
//! // Five consecutive detections confirm the target
//! let mut frames = MockFrameSource::new();
//! frames.queue_blank_frames(6);
//! let mut detector = MockDetector::new();
//! for _ in 0..5 {
//!     detector.push_frame_labels(&["hammer"]);
//! }
//!
//! let mut rover = Rover::new(drive, sensors, frames, detector, config);
//! let report = rover.run_session("hammer", &CancellationToken::new()).unwrap();
//! assert!(report.is_success());
//! rover.shutdown().unwrap();
//! ```

#![warn(missing_docs)]

/// Shared configuration for timing, speeds, and thresholds.
pub mod config;
/// Detection debouncing and search outcomes.
pub mod confirm;
/// Differential drive unit over H-bridge direction lines.
pub mod drive;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// The line-tracking steering policy.
pub mod policy;
/// Software PWM generation on dedicated timing threads.
pub mod pwm;
/// Reflective line-sensor array.
pub mod sensors;
/// Search-session orchestration.
pub mod session;
/// Voice-command line parsing.
pub mod speech;
/// The cancellable background line-tracking task.
pub mod tracking;
/// Core traits for hardware and vision collaborators.
pub mod traits;

// Re-exports for convenience
pub use config::{label, Config, Label, PwmConfig, SearchConfig, TrackingConfig, MAX_LABEL};
pub use confirm::{ConfirmationTracker, SearchOutcome};
pub use drive::{DriveUnit, Motor, MotorSelect};
pub use policy::{decide, Maneuver};
pub use pwm::{PwmChannel, PwmError};
pub use sensors::{SensorArray, SensorReading};
pub use session::{Rover, SessionError, SessionReport};
pub use speech::{parse_command, KEYWORD_TABLE, RECOGNITION_MARKER};
pub use tracking::{CancellationToken, TaskState, TaskStateProbe, TrackingError, TrackingTask};
pub use traits::{
    // Hardware
    DigitalLine,
    Direction,
    // Vision
    BoundingBox,
    Detection,
    Detector,
    Frame,
    FrameSource,
};
