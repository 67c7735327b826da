//! Reflective line-sensor array.
//!
//! Four downward-facing infrared sensors report whether the black line
//! is under them. The hardware convention is active-low: a line reads
//! electrically low when it detects the line. [`SensorArray::read`]
//! folds the four lines into one [`SensorReading`] snapshot per call.
//!
//! There is no debouncing here. A noisy read is tolerated because the
//! tracking loop corrects it on the next ~20 ms cycle; debouncing for
//! vision lives in [`crate::confirm`].

use log::warn;

use crate::traits::DigitalLine;

/// Snapshot of the four line sensors (`true` = line detected).
///
/// Field order follows the physical layout, left to right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorReading {
    /// Outermost left sensor (L1).
    pub left_outer: bool,
    /// Inner left sensor (L2).
    pub left_inner: bool,
    /// Inner right sensor (R1).
    pub right_inner: bool,
    /// Outermost right sensor (R2).
    pub right_outer: bool,
}

impl SensorReading {
    /// Reading with no sensor over the line.
    pub const NONE: Self = Self {
        left_outer: false,
        left_inner: false,
        right_inner: false,
        right_outer: false,
    };

    /// Returns true if any sensor detects the line.
    pub fn any(&self) -> bool {
        self.left_outer || self.left_inner || self.right_inner || self.right_outer
    }
}

/// The four-sensor array.
///
/// A failing line read is logged and that sensor reports "no line",
/// which biases the policy toward its fail-safe stop. The array also
/// tracks how many consecutive reads contained a fault; the tracking
/// loop forces a stop once the streak reaches the configured limit.
#[derive(Debug)]
pub struct SensorArray<L: DigitalLine> {
    left_outer: L,
    left_inner: L,
    right_inner: L,
    right_outer: L,
    fault_streak: u32,
}

impl<L: DigitalLine> SensorArray<L> {
    /// Creates an array from its four input lines, left to right.
    pub fn new(left_outer: L, left_inner: L, right_inner: L, right_outer: L) -> Self {
        Self {
            left_outer,
            left_inner,
            right_inner,
            right_outer,
            fault_streak: 0,
        }
    }

    /// Take one snapshot of all four sensors.
    ///
    /// Active-low: an electrically low line means "line detected".
    pub fn read(&mut self) -> SensorReading {
        let mut faulted = false;
        let mut probe = |line: &L, name: &str| match line.read() {
            Ok(level) => !level,
            Err(e) => {
                warn!("sensors: {name} read failed: {e:?}");
                faulted = true;
                false
            }
        };

        let reading = SensorReading {
            left_outer: probe(&self.left_outer, "left-outer"),
            left_inner: probe(&self.left_inner, "left-inner"),
            right_inner: probe(&self.right_inner, "right-inner"),
            right_outer: probe(&self.right_outer, "right-outer"),
        };

        if faulted {
            self.fault_streak += 1;
        } else {
            self.fault_streak = 0;
        }
        reading
    }

    /// Number of consecutive reads that contained at least one fault.
    pub fn fault_streak(&self) -> u32 {
        self.fault_streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockLine;

    fn array_with_probes() -> (SensorArray<MockLine>, [MockLine; 4]) {
        let lines = [
            MockLine::new(),
            MockLine::new(),
            MockLine::new(),
            MockLine::new(),
        ];
        let probes = lines.clone();
        let [l1, l2, r1, r2] = lines;
        (SensorArray::new(l1, l2, r1, r2), probes)
    }

    #[test]
    fn active_low_decoding() {
        let (mut array, probes) = array_with_probes();

        // All lines high: nothing detected
        for probe in &probes {
            probe.set_input(true);
        }
        assert_eq!(array.read(), SensorReading::NONE);

        // Inner sensors low: line under the middle of the robot
        probes[1].set_input(false);
        probes[2].set_input(false);
        let reading = array.read();
        assert!(!reading.left_outer);
        assert!(reading.left_inner);
        assert!(reading.right_inner);
        assert!(!reading.right_outer);
        assert!(reading.any());
    }

    #[test]
    fn faulted_sensor_reads_as_no_line() {
        let (mut array, probes) = array_with_probes();
        probes[0].set_input(false); // would read as detected
        probes[0].fail_reads(true);
        for probe in &probes[1..] {
            probe.set_input(true);
        }

        let reading = array.read();
        assert!(!reading.left_outer);
        assert_eq!(array.fault_streak(), 1);
    }

    #[test]
    fn fault_streak_counts_and_resets() {
        let (mut array, probes) = array_with_probes();
        probes[3].fail_reads(true);

        array.read();
        array.read();
        array.read();
        assert_eq!(array.fault_streak(), 3);

        probes[3].fail_reads(false);
        array.read();
        assert_eq!(array.fault_streak(), 0);
    }
}
