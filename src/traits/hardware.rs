//! Hardware abstraction traits for GPIO line access.
//!
//! This module defines the single capability the motion subsystem needs
//! from the hardware: a settable/readable digital line. Everything else
//! (PWM timing, direction logic, sensor decoding) is built on top of it
//! in pure Rust, which is what makes the whole drive stack testable on
//! a desktop with the mocks from [`crate::hal::mock`].
//!
//! # Key Types
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`DigitalLine`] | One GPIO pin, output or input |
//! | [`Direction`] | Per-motor drive direction |
//!
//! # Example
//!
//! ```rust
//! use trackbot::traits::{DigitalLine, Direction};
//! use trackbot::hal::MockLine;
//!
//! let mut line = MockLine::new();
//! line.set_high().unwrap();
//! assert!(line.read().unwrap());
//!
//! assert_eq!(Direction::Forward.as_str(), "forward");
//! ```

use core::fmt;

/// A single digital GPIO line.
///
/// Implement this for your GPIO backend (a character-device line on
/// Linux, a pin on a microcontroller HAL, or a mock for tests). The
/// PWM channel, drive unit, and sensor array are all generic over it.
///
/// # Implementation Notes
///
/// - Writes and reads may fail; the motion subsystem logs line faults
///   and falls back to its fail-safe behavior rather than propagating
///   them to the caller.
/// - Electrical level is reported as-is. The sensor array applies the
///   active-low convention itself.
pub trait DigitalLine {
    /// Error type for line operations.
    ///
    /// Must be `Debug` so faults can be logged where they are absorbed.
    type Error: fmt::Debug;

    /// Drive the line high.
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the line low.
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Read the electrical level (`true` = high).
    fn read(&self) -> Result<bool, Self::Error>;

    /// Drive the line to the given level.
    fn set_level(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }
}

/// Drive direction for one motor.
///
/// Maps to the two H-bridge direction lines of that motor: exactly one
/// line is asserted for [`Forward`](Self::Forward) and
/// [`Backward`](Self::Backward), neither for [`Stopped`](Self::Stopped).
/// Both lines asserted at once is never valid.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Wheel turning forward.
    Forward,
    /// Wheel turning backward.
    Backward,
    /// Wheel not driven (both direction lines deasserted).
    #[default]
    Stopped,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use trackbot::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Backward.as_str(), "backward");
    /// assert_eq!(Direction::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Stopped => "stopped",
        }
    }
}
