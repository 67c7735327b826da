//! Search-session orchestration.
//!
//! [`Rover`] ties the subsystems together. One session fulfils one
//! spoken command: the line-tracking task is spawned in the background,
//! the foreground search runs frame-by-frame until the target is
//! confirmed, the operator cancels, or the frame pipeline fails; then,
//! regardless of outcome, the tracking task is signalled and
//! joined *before* the report is returned. The caller never sees a
//! result while the robot is still moving.
//!
//! # Example
//!
//! ```rust
//! use trackbot::{
//!     hal::{MockDetector, MockFrameSource, MockLine},
//!     CancellationToken, Config, DriveUnit, PwmChannel, Rover, SensorArray,
//! };
//!
//! let mk = || MockLine::new();
//! let high = || {
//!     let line = MockLine::new();
//!     line.set_input(true); // active-low: high = no line under sensor
//!     line
//! };
//!
//! let config = Config::default();
//! let pwm_a = PwmChannel::start(mk(), config.pwm.frequency_hz, 0);
//! let pwm_b = PwmChannel::start(mk(), config.pwm.frequency_hz, 0);
//! let drive = DriveUnit::new((mk(), mk()), (mk(), mk()), pwm_a, pwm_b, 30);
//! let sensors = SensorArray::new(high(), high(), high(), high());
//!
//! let mut frames = MockFrameSource::new();
//! frames.queue_blank_frames(6);
//! let mut detector = MockDetector::new();
//! for _ in 0..5 {
//!     detector.push_frame_labels(&["hammer"]);
//! }
//!
//! let mut rover = Rover::new(drive, sensors, frames, detector, config);
//! let report = rover
//!     .run_session("hammer", &CancellationToken::new())
//!     .unwrap();
//! assert!(report.is_success());
//! rover.shutdown().unwrap();
//! ```

use std::fmt;

use log::{info, warn};

use crate::config::{label, Config, Label};
use crate::confirm::{ConfirmationTracker, SearchOutcome};
use crate::drive::DriveUnit;
use crate::pwm::PwmError;
use crate::sensors::SensorArray;
use crate::tracking::{CancellationToken, TaskState, TaskStateProbe, TrackingError, TrackingTask};
use crate::traits::{Detector, DigitalLine, FrameSource};

/// Result of one completed session.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionReport {
    /// The label that was searched for.
    pub target: Label,
    /// How the search ended.
    pub outcome: SearchOutcome,
}

impl SessionReport {
    /// True only when the target was confirmed.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            SearchOutcome::Confirmed(frame) => {
                write!(f, "target '{}' confirmed (frame {})", self.target, frame.seq)
            }
            SearchOutcome::Cancelled => {
                write!(f, "search for '{}' was cancelled", self.target)
            }
            SearchOutcome::Aborted => {
                write!(f, "search for '{}' failed: frame source fault", self.target)
            }
        }
    }
}

/// Fatal session errors.
///
/// Ordinary search failures (cancel, frame fault) are reported in the
/// [`SessionReport`]; these errors mean the subsystem itself is in a
/// bad state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// A session is already holding the drive hardware.
    SessionActive,
    /// The tracking task could not be torn down; a motor may still be
    /// energized.
    Tracking(TrackingError),
    /// A PWM timing thread failed to stop cleanly at shutdown.
    Shutdown(PwmError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::SessionActive => write!(f, "a session is already active"),
            SessionError::Tracking(e) => write!(f, "tracking teardown failed: {e}"),
            SessionError::Shutdown(e) => write!(f, "shutdown failed: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TrackingError> for SessionError {
    fn from(e: TrackingError) -> Self {
        SessionError::Tracking(e)
    }
}

impl From<PwmError> for SessionError {
    fn from(e: PwmError) -> Self {
        SessionError::Shutdown(e)
    }
}

/// The session orchestrator.
///
/// Owns the drive hardware between sessions and the vision
/// collaborators throughout. At most one tracking task is alive per
/// session; the hardware moves into the task and back out on join.
pub struct Rover<L, F, D>
where
    L: DigitalLine,
    F: FrameSource,
    D: Detector,
{
    drive: Option<DriveUnit<L>>,
    sensors: Option<SensorArray<L>>,
    frames: F,
    detector: D,
    config: Config,
    last_task: Option<TaskStateProbe>,
}

impl<L, F, D> Rover<L, F, D>
where
    L: DigitalLine + Send + 'static,
    F: FrameSource,
    D: Detector,
{
    /// Assemble a rover from its subsystems.
    pub fn new(
        drive: DriveUnit<L>,
        sensors: SensorArray<L>,
        frames: F,
        detector: D,
        config: Config,
    ) -> Self {
        Self {
            drive: Some(drive),
            sensors: Some(sensors),
            frames,
            detector,
            config,
            last_task: None,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The drive unit, when no session holds it.
    pub fn drive(&self) -> Option<&DriveUnit<L>> {
        self.drive.as_ref()
    }

    /// State of the most recent tracking task ([`TaskState::Idle`] if
    /// none has run yet).
    pub fn tracking_state(&self) -> TaskState {
        self.last_task
            .as_ref()
            .map(|probe| probe.get())
            .unwrap_or(TaskState::Idle)
    }

    /// Run one search session for `target`.
    ///
    /// Line tracking runs in the background for the whole session. The
    /// `cancel` token is the operator's abort control for the
    /// foreground search. On return, whatever the outcome, the tracking task
    /// has been joined and the drive's last command is stop.
    pub fn run_session(
        &mut self,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionReport, SessionError> {
        let (drive, sensors) = match (self.drive.take(), self.sensors.take()) {
            (Some(drive), Some(sensors)) => (drive, sensors),
            _ => return Err(SessionError::SessionActive),
        };

        info!("session: searching for '{target}'");
        let task = TrackingTask::spawn(
            drive,
            sensors,
            self.config.tracking.clone(),
            CancellationToken::new(),
        );
        self.last_task = Some(task.probe());

        let outcome = self.run_search(target, cancel);

        // Foreground result first, then background teardown, then
        // report: the robot is stationary before anything surfaces.
        let (drive, sensors) = task.stop_and_join()?;
        self.drive = Some(drive);
        self.sensors = Some(sensors);

        let report = SessionReport {
            target: label(target),
            outcome,
        };
        info!("session: {report}");
        Ok(report)
    }

    fn run_search(&mut self, target: &str, cancel: &CancellationToken) -> SearchOutcome {
        let mut tracker =
            ConfirmationTracker::new(self.config.search.confirmation_threshold);

        loop {
            let frame = match self.frames.capture() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("session: frame capture failed, aborting search: {e:?}");
                    return SearchOutcome::Aborted;
                }
            };

            let present = match self.detector.detect(&frame) {
                Ok(detections) => detections.iter().any(|d| d.label.as_str() == target),
                Err(e) => {
                    warn!("session: detector failed, aborting search: {e:?}");
                    return SearchOutcome::Aborted;
                }
            };
            tracker.observe(present);

            // Operator intent outranks a confirming frame that arrives
            // in the same step.
            if cancel.is_cancelled() {
                return SearchOutcome::Cancelled;
            }
            if tracker.is_confirmed() {
                return SearchOutcome::Confirmed(frame);
            }
        }
    }

    /// Release everything, in order: motors stopped, PWM timing threads
    /// joined, then direction and sensor lines dropped.
    pub fn shutdown(mut self) -> Result<(), SessionError> {
        if let Some(drive) = self.drive.take() {
            drive.shutdown()?;
        }
        // Sensor lines release when the array drops, after the motors
        // are verifiably stopped.
        self.sensors.take();
        Ok(())
    }
}
