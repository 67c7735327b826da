//! Differential drive unit.
//!
//! Two motors, A (left wheel) and B (right wheel), each driven by two
//! H-bridge direction lines and one [`PwmChannel`] for speed. The
//! motion primitives mirror the control calls the tracking policy
//! issues: `forward`/`backward`/`stop` addressable per motor or for
//! both, plus the composed maneuvers (`run`, `soft_left`, `spin_right`,
//! ...) that [`apply`](DriveUnit::apply) dispatches to.
//!
//! Speed arguments are `Option<u8>`: `None` changes direction only and
//! preserves the current duty. The policy relies on this to steer by
//! direction at a held speed.
//!
//! # Safety invariant
//!
//! The two direction lines of a motor are never both high. Direction
//! changes deassert the opposing line before asserting the new one.
//!
//! # Example
//!
//! ```rust
//! use trackbot::{hal::MockLine, Direction, DriveUnit, Motor, MotorSelect, PwmChannel};
//!
//! let mk = || MockLine::new();
//! let pwm_a = PwmChannel::start(mk(), 500, 0);
//! let pwm_b = PwmChannel::start(mk(), 500, 0);
//! let mut drive = DriveUnit::new((mk(), mk()), (mk(), mk()), pwm_a, pwm_b, 30);
//!
//! drive.forward(MotorSelect::All, Some(50)).unwrap();
//! assert_eq!(drive.last_command(Motor::A), Direction::Forward);
//! assert_eq!(drive.speed(Motor::A), 50);
//!
//! drive.stop(MotorSelect::All).unwrap();
//! assert_eq!(drive.last_command(Motor::B), Direction::Stopped);
//! drive.shutdown().unwrap();
//! ```

use log::warn;

use crate::policy::Maneuver;
use crate::pwm::{PwmChannel, PwmError};
use crate::traits::{DigitalLine, Direction};

/// One of the two drive motors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Motor {
    /// Left wheel.
    A,
    /// Right wheel.
    B,
}

/// Target of a motion primitive: one motor or both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorSelect {
    /// Left wheel only.
    A,
    /// Right wheel only.
    B,
    /// Both wheels.
    All,
}

impl From<Motor> for MotorSelect {
    fn from(motor: Motor) -> Self {
        match motor {
            Motor::A => MotorSelect::A,
            Motor::B => MotorSelect::B,
        }
    }
}

impl MotorSelect {
    fn includes_a(self) -> bool {
        matches!(self, MotorSelect::A | MotorSelect::All)
    }

    fn includes_b(self) -> bool {
        matches!(self, MotorSelect::B | MotorSelect::All)
    }
}

/// The differential drive: direction lines plus PWM speed per motor.
///
/// Owns its PWM channels; [`shutdown`](Self::shutdown) stops the motors
/// first and then joins both timing threads, so no orphaned thread can
/// keep driving a line after teardown.
#[derive(Debug)]
pub struct DriveUnit<L: DigitalLine> {
    ain1: L,
    ain2: L,
    bin1: L,
    bin2: L,
    pwm_a: PwmChannel,
    pwm_b: PwmChannel,
    speed_a: u8,
    speed_b: u8,
    last_a: Direction,
    last_b: Direction,
}

impl<L: DigitalLine> DriveUnit<L> {
    /// Create a drive unit from the direction line pairs `(in1, in2)`
    /// for motors A and B, their running PWM channels, and the starting
    /// speed applied to both motors.
    pub fn new(
        a_lines: (L, L),
        b_lines: (L, L),
        pwm_a: PwmChannel,
        pwm_b: PwmChannel,
        initial_speed: u8,
    ) -> Self {
        let mut unit = Self {
            ain1: a_lines.0,
            ain2: a_lines.1,
            bin1: b_lines.0,
            bin2: b_lines.1,
            pwm_a,
            pwm_b,
            speed_a: 0,
            speed_b: 0,
            last_a: Direction::Stopped,
            last_b: Direction::Stopped,
        };
        unit.set_speed(Motor::A, initial_speed);
        unit.set_speed(Motor::B, initial_speed);
        unit
    }

    /// Set one motor's speed (duty percentage, clamped to 0-100).
    pub fn set_speed(&mut self, motor: Motor, speed: u8) {
        let speed = speed.min(100);
        match motor {
            Motor::A => {
                self.speed_a = speed;
                self.pwm_a.set_duty(speed);
            }
            Motor::B => {
                self.speed_b = speed;
                self.pwm_b.set_duty(speed);
            }
        }
    }

    /// Current speed setting for one motor.
    pub fn speed(&self, motor: Motor) -> u8 {
        match motor {
            Motor::A => self.speed_a,
            Motor::B => self.speed_b,
        }
    }

    /// Last direction commanded for one motor.
    pub fn last_command(&self, motor: Motor) -> Direction {
        match motor {
            Motor::A => self.last_a,
            Motor::B => self.last_b,
        }
    }

    fn apply_speed(&mut self, sel: MotorSelect, speed: Option<u8>) {
        if let Some(speed) = speed {
            if sel.includes_a() {
                self.set_speed(Motor::A, speed);
            }
            if sel.includes_b() {
                self.set_speed(Motor::B, speed);
            }
        }
    }

    /// Drive the selected motor(s) forward.
    ///
    /// `None` preserves the current speed and only writes direction.
    pub fn forward(&mut self, sel: MotorSelect, speed: Option<u8>) -> Result<(), L::Error> {
        self.apply_speed(sel, speed);
        if sel.includes_a() {
            // Deassert before assert: both lines high is never valid
            self.ain2.set_low()?;
            self.ain1.set_high()?;
            self.last_a = Direction::Forward;
        }
        if sel.includes_b() {
            self.bin2.set_low()?;
            self.bin1.set_high()?;
            self.last_b = Direction::Forward;
        }
        Ok(())
    }

    /// Drive the selected motor(s) backward.
    ///
    /// `None` preserves the current speed and only writes direction.
    pub fn backward(&mut self, sel: MotorSelect, speed: Option<u8>) -> Result<(), L::Error> {
        self.apply_speed(sel, speed);
        if sel.includes_a() {
            self.ain1.set_low()?;
            self.ain2.set_high()?;
            self.last_a = Direction::Backward;
        }
        if sel.includes_b() {
            self.bin1.set_low()?;
            self.bin2.set_high()?;
            self.last_b = Direction::Backward;
        }
        Ok(())
    }

    /// Stop the selected motor(s): both direction lines low. Stopping
    /// all motors also zeroes both duty cycles.
    ///
    /// Best-effort: every line is attempted even if an earlier write
    /// fails; the first error is returned.
    pub fn stop(&mut self, sel: MotorSelect) -> Result<(), L::Error> {
        let mut first_err = None;
        if sel.includes_a() {
            for line in [&mut self.ain1, &mut self.ain2] {
                if let Err(e) = line.set_low() {
                    first_err.get_or_insert(e);
                }
            }
            self.last_a = Direction::Stopped;
        }
        if sel.includes_b() {
            for line in [&mut self.bin1, &mut self.bin2] {
                if let Err(e) = line.set_low() {
                    first_err.get_or_insert(e);
                }
            }
            self.last_b = Direction::Stopped;
        }
        if matches!(sel, MotorSelect::All) {
            self.pwm_a.set_duty(0);
            self.pwm_b.set_duty(0);
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Both wheels forward at the given speeds.
    pub fn run(&mut self, left_speed: u8, right_speed: u8) -> Result<(), L::Error> {
        self.set_speed(Motor::A, left_speed);
        self.set_speed(Motor::B, right_speed);
        self.forward(MotorSelect::All, None)
    }

    /// Turn left: right wheel forward, left wheel stopped.
    pub fn soft_left(&mut self, speed: u8) -> Result<(), L::Error> {
        self.set_speed(Motor::A, 0);
        self.set_speed(Motor::B, speed);
        self.stop(MotorSelect::A)?;
        self.forward(MotorSelect::B, None)
    }

    /// Turn right: left wheel forward, right wheel stopped.
    pub fn soft_right(&mut self, speed: u8) -> Result<(), L::Error> {
        self.set_speed(Motor::A, speed);
        self.set_speed(Motor::B, 0);
        self.forward(MotorSelect::A, None)?;
        self.stop(MotorSelect::B)
    }

    /// Spin in place to the left: left wheel backward, right forward.
    pub fn spin_left(&mut self, speed: u8) -> Result<(), L::Error> {
        self.set_speed(Motor::A, speed);
        self.set_speed(Motor::B, speed);
        self.backward(MotorSelect::A, None)?;
        self.forward(MotorSelect::B, None)
    }

    /// Spin in place to the right: left wheel forward, right backward.
    pub fn spin_right(&mut self, speed: u8) -> Result<(), L::Error> {
        self.set_speed(Motor::A, speed);
        self.set_speed(Motor::B, speed);
        self.forward(MotorSelect::A, None)?;
        self.backward(MotorSelect::B, None)
    }

    /// Execute one policy maneuver.
    ///
    /// The hold on held spin corrections is the tracking loop's job;
    /// this only writes direction and duty.
    pub fn apply(&mut self, maneuver: Maneuver) -> Result<(), L::Error> {
        match maneuver {
            Maneuver::Stop => self.stop(MotorSelect::All),
            Maneuver::Straight { speed } => self.run(speed, speed),
            Maneuver::SoftLeft { speed } => self.soft_left(speed),
            Maneuver::SoftRight { speed } => self.soft_right(speed),
            Maneuver::SpinLeft { speed, .. } => self.spin_left(speed),
            Maneuver::SpinRight { speed, .. } => self.spin_right(speed),
        }
    }

    /// Tear down in order: motors stopped, then both PWM timing threads
    /// joined. Line handles are released when the unit drops.
    pub fn shutdown(mut self) -> Result<(), PwmError> {
        if let Err(e) = self.stop(MotorSelect::All) {
            warn!("drive: failed to deassert direction lines during shutdown: {e:?}");
        }
        self.pwm_a.stop()?;
        self.pwm_b.stop()?;
        Ok(())
    }
}
