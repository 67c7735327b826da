//! Software PWM generation.
//!
//! Each [`PwmChannel`] owns a dedicated timing thread that toggles one
//! output line: high for `period * duty / 100`, low for the remainder,
//! repeated until stopped. Duty 0 and 100 degenerate to a line held
//! constant for the whole period with no toggling.
//!
//! The duty cycle lives in a single [`AtomicU8`], so [`set_duty`] from
//! another thread can never be observed torn; the timing loop reads it
//! once per cycle, so an update takes effect within one period and
//! never mid-pulse.
//!
//! The output line is forced low on every exit path of the timing
//! thread, including a write fault or a panic. A write fault is logged
//! and treated as a stop request.
//!
//! [`set_duty`]: PwmChannel::set_duty
//!
//! # Example
//!
//! ```rust
//! use trackbot::{hal::MockLine, PwmChannel};
//!
//! let line = MockLine::new();
//! let probe = line.clone();
//!
//! let mut pwm = PwmChannel::start(line, 500, 0);
//! pwm.set_duty(50);
//! std::thread::sleep(std::time::Duration::from_millis(10));
//! pwm.stop().unwrap();
//!
//! // Stopped channel leaves the line low
//! assert!(!probe.is_high());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;

use crate::traits::DigitalLine;

/// Error from stopping a PWM channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PwmError {
    /// The timing thread panicked instead of exiting cleanly.
    ///
    /// Treated as fatal by callers: the output state is unknown beyond
    /// the thread's own line-low cleanup guard.
    TimingTaskPanicked,
}

impl fmt::Display for PwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PwmError::TimingTaskPanicked => write!(f, "PWM timing thread panicked"),
        }
    }
}

impl std::error::Error for PwmError {}

/// One software PWM output channel.
///
/// Created with [`start`](Self::start), which launches the timing
/// thread immediately. Dropping the channel stops the thread and joins
/// it, so a channel can never outlive its owner and keep a motor
/// energized.
#[derive(Debug)]
pub struct PwmChannel {
    duty: Arc<AtomicU8>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl PwmChannel {
    /// Start a channel on `line` at `frequency_hz`, with an initial
    /// duty cycle (clamped to 0-100).
    ///
    /// The line is owned by the timing thread until [`stop`](Self::stop).
    pub fn start<L>(line: L, frequency_hz: u32, initial_duty: u8) -> Self
    where
        L: DigitalLine + Send + 'static,
    {
        let duty = Arc::new(AtomicU8::new(initial_duty.min(100)));
        let running = Arc::new(AtomicBool::new(true));
        let period = Duration::from_secs_f64(1.0 / frequency_hz.max(1) as f64);

        let handle = {
            let duty = Arc::clone(&duty);
            let running = Arc::clone(&running);
            thread::spawn(move || pwm_loop(line, period, &duty, &running))
        };

        Self {
            duty,
            running,
            handle: Some(handle),
            period,
        }
    }

    /// Update the live duty-cycle target (clamped to 0-100).
    ///
    /// Takes effect within one period; the current pulse is never cut
    /// short.
    pub fn set_duty(&self, duty: u8) {
        self.duty.store(duty.min(100), Ordering::Relaxed);
    }

    /// Current duty-cycle target.
    pub fn duty(&self) -> u8 {
        self.duty.load(Ordering::Relaxed)
    }

    /// Configured period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Signal the timing thread to exit and block until it has.
    ///
    /// The thread drives the line low before exiting. Idempotent.
    pub fn stop(&mut self) -> Result<(), PwmError> {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| PwmError::TimingTaskPanicked)?;
        }
        Ok(())
    }
}

impl Drop for PwmChannel {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("pwm: {e} during drop");
        }
    }
}

/// Drives the wrapped line low when dropped, so the output cannot stay
/// high on any exit path of the timing loop.
struct LowOnExit<L: DigitalLine>(L);

impl<L: DigitalLine> Drop for LowOnExit<L> {
    fn drop(&mut self) {
        if let Err(e) = self.0.set_low() {
            warn!("pwm: failed to force output low on exit: {e:?}");
        }
    }
}

fn pwm_loop<L: DigitalLine>(
    line: L,
    period: Duration,
    duty: &AtomicU8,
    running: &AtomicBool,
) {
    let mut guard = LowOnExit(line);
    let line = &mut guard.0;

    while running.load(Ordering::Acquire) {
        // One read per cycle: duty changes land on the next period.
        let duty = u32::from(duty.load(Ordering::Relaxed).min(100));

        if duty > 0 {
            if let Err(e) = line.set_high() {
                warn!("pwm: output write failed, stopping channel: {e:?}");
                break;
            }
            thread::sleep(period.mul_f64(f64::from(duty) / 100.0));
        }
        if duty < 100 {
            if let Err(e) = line.set_low() {
                warn!("pwm: output write failed, stopping channel: {e:?}");
                break;
            }
            thread::sleep(period.mul_f64(f64::from(100 - duty) / 100.0));
        }
    }
}
