//! Background line-tracking task.
//!
//! [`TrackingTask::spawn`] moves the drive unit and sensor array into a
//! dedicated thread running the poll/decide/apply loop. The owner keeps
//! a handle with the task's state and its cancellation token; a clean
//! join hands the hardware back for the next session.
//!
//! Cancellation is cooperative: the token is checked once per loop
//! iteration, never mid-iteration, so a held correction always runs to
//! completion. Whatever way the loop exits (stop request, fault, or
//! panic), a drop guard issues a final all-motor stop before the thread
//! ends. The robot cannot coast after the task reports stopped.
//!
//! A task that fails to stop within the configured grace period is a
//! fatal condition: it means a motor may still be energized, and
//! [`TrackingTask::stop_and_join`] reports it as an error rather than
//! waiting forever.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use crate::config::TrackingConfig;
use crate::drive::{DriveUnit, MotorSelect};
use crate::policy::{decide, Maneuver};
use crate::sensors::SensorArray;
use crate::traits::DigitalLine;

/// Lifecycle state of the tracking task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TaskState {
    /// Spawned but the loop has not started yet.
    Idle = 0,
    /// Loop is polling and driving.
    Running = 1,
    /// Stop requested, loop finishing its current iteration.
    Stopping = 2,
    /// Loop has exited and the final stop has been issued.
    Stopped = 3,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TaskState::Idle,
            1 => TaskState::Running,
            2 => TaskState::Stopping,
            _ => TaskState::Stopped,
        }
    }
}

/// Shared stop signal: single writer, checked at iteration boundaries.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Irreversible.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Has cancellation been requested?
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Read-only view of a task's state cell.
///
/// Stays valid after the task handle is consumed by
/// [`TrackingTask::stop_and_join`].
#[derive(Clone, Debug)]
pub struct TaskStateProbe {
    state: Arc<AtomicU8>,
}

impl TaskStateProbe {
    /// Current task state.
    pub fn get(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }
}

/// Error from tearing down the tracking task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingError {
    /// The task did not stop within the grace period. Fatal: a motor
    /// may still be energized.
    StopTimeout,
    /// The task panicked; its stop guard ran, but the hardware handles
    /// were lost with the thread.
    TaskPanicked,
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingError::StopTimeout => {
                write!(f, "tracking task did not stop within the grace period")
            }
            TrackingError::TaskPanicked => write!(f, "tracking task panicked"),
        }
    }
}

impl std::error::Error for TrackingError {}

/// Handle to a spawned tracking task.
pub struct TrackingTask<L: DigitalLine> {
    state: Arc<AtomicU8>,
    token: CancellationToken,
    handle: JoinHandle<()>,
    hardware: Receiver<(DriveUnit<L>, SensorArray<L>)>,
    grace: Duration,
}

impl<L> TrackingTask<L>
where
    L: DigitalLine + Send + 'static,
{
    /// Spawn the tracking loop, taking ownership of the hardware.
    pub fn spawn(
        drive: DriveUnit<L>,
        sensors: SensorArray<L>,
        cfg: TrackingConfig,
        token: CancellationToken,
    ) -> Self {
        let state = Arc::new(AtomicU8::new(TaskState::Idle as u8));
        let grace = Duration::from_millis(cfg.stop_grace_ms);
        let (tx, rx) = mpsc::channel();

        let handle = {
            let state = Arc::clone(&state);
            let token = token.clone();
            thread::spawn(move || track_loop(drive, sensors, cfg, token, &state, tx))
        };

        Self {
            state,
            token,
            handle,
            hardware: rx,
            grace,
        }
    }

    /// Current task state.
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// A state view that outlives this handle.
    pub fn probe(&self) -> TaskStateProbe {
        TaskStateProbe {
            state: Arc::clone(&self.state),
        }
    }

    /// Request a cooperative stop without waiting for it.
    pub fn request_stop(&self) {
        self.token.cancel();
        let _ = self.state.compare_exchange(
            TaskState::Running as u8,
            TaskState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Stop the task and wait for it, reclaiming the hardware.
    ///
    /// The returned drive unit has already been issued its final stop
    /// by the task. Exceeding the grace period or a panicked task is an
    /// error the caller must treat as fatal.
    pub fn stop_and_join(self) -> Result<(DriveUnit<L>, SensorArray<L>), TrackingError> {
        self.request_stop();
        let hardware = match self.hardware.recv_timeout(self.grace) {
            Ok(hardware) => hardware,
            Err(RecvTimeoutError::Timeout) => return Err(TrackingError::StopTimeout),
            Err(RecvTimeoutError::Disconnected) => {
                // Sender dropped without handing hardware back: the
                // thread panicked. Reap it for the panic payload.
                let _ = self.handle.join();
                return Err(TrackingError::TaskPanicked);
            }
        };
        self.handle
            .join()
            .map_err(|_| TrackingError::TaskPanicked)?;
        Ok(hardware)
    }
}

/// Issues a final all-motor stop when dropped, covering the panic path;
/// the normal path goes through [`finish`](Self::finish) so the
/// hardware can be handed back.
struct StopGuard<L: DigitalLine> {
    inner: Option<(DriveUnit<L>, SensorArray<L>)>,
}

impl<L: DigitalLine> StopGuard<L> {
    fn new(drive: DriveUnit<L>, sensors: SensorArray<L>) -> Self {
        Self {
            inner: Some((drive, sensors)),
        }
    }

    fn parts(&mut self) -> (&mut DriveUnit<L>, &mut SensorArray<L>) {
        let inner = self
            .inner
            .as_mut()
            .expect("hardware present until finish()");
        (&mut inner.0, &mut inner.1)
    }

    fn halt(drive: &mut DriveUnit<L>) {
        if let Err(e) = drive.stop(MotorSelect::All) {
            warn!("tracking: final stop failed: {e:?}");
        }
    }

    fn finish(mut self) -> (DriveUnit<L>, SensorArray<L>) {
        let (mut drive, sensors) = self
            .inner
            .take()
            .expect("hardware present until finish()");
        Self::halt(&mut drive);
        (drive, sensors)
    }
}

impl<L: DigitalLine> Drop for StopGuard<L> {
    fn drop(&mut self) {
        if let Some((mut drive, _sensors)) = self.inner.take() {
            Self::halt(&mut drive);
        }
    }
}

fn track_loop<L: DigitalLine>(
    drive: DriveUnit<L>,
    sensors: SensorArray<L>,
    cfg: TrackingConfig,
    token: CancellationToken,
    state: &AtomicU8,
    tx: Sender<(DriveUnit<L>, SensorArray<L>)>,
) {
    state.store(TaskState::Running as u8, Ordering::Release);
    debug!("tracking: loop started");

    let poll = Duration::from_millis(cfg.poll_ms);
    let mut guard = StopGuard::new(drive, sensors);

    while !token.is_cancelled() {
        let (drive, sensors) = guard.parts();

        let reading = sensors.read();
        let maneuver = if sensors.fault_streak() >= cfg.sensor_fault_limit {
            // Persistent sensor faults: same fail-safe as losing the line
            Maneuver::Stop
        } else {
            decide(reading, &cfg)
        };

        if let Err(e) = drive.apply(maneuver) {
            warn!("tracking: drive command failed: {e:?}");
        }

        // Held corrections get their hold before the regular poll delay
        let hold = maneuver.hold_ms();
        if hold > 0 {
            thread::sleep(Duration::from_millis(hold));
        }
        thread::sleep(poll);
    }

    let hardware = guard.finish();
    state.store(TaskState::Stopped as u8, Ordering::Release);
    debug!("tracking: loop stopped");
    let _ = tx.send(hardware);
}
