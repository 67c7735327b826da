//! Line-following decision policy.
//!
//! [`decide`] is a pure function from one sensor snapshot to one motion
//! command. The rules are evaluated in a fixed precedence order and the
//! first match wins; the conditions overlap, so the ordering is part of
//! the behavior, not an implementation detail.
//!
//! The intuition behind the ordering: an outer sensor firing together
//! with the far side means the robot has drifted badly and needs a
//! sharp, briefly-held spin; a single outer sensor means a milder
//! drift; inner-sensor-only patterns are the steady-state fine-steering
//! signal. The held corrections deliberately pause the tracking loop so
//! the spin has time to act before the next read; correction authority
//! is traded against loop reactivity on purpose.
//!
//! # Example
//!
//! ```rust
//! use trackbot::{decide, Maneuver, SensorReading, TrackingConfig};
//!
//! let cfg = TrackingConfig::default();
//!
//! // No sensor sees the line: fail-safe stop
//! assert_eq!(decide(SensorReading::NONE, &cfg), Maneuver::Stop);
//!
//! // Both inner sensors on the line: straight ahead
//! let centered = SensorReading {
//!     left_inner: true,
//!     right_inner: true,
//!     ..SensorReading::NONE
//! };
//! assert_eq!(decide(centered, &cfg), Maneuver::Straight { speed: 15 });
//! ```

use crate::config::TrackingConfig;
use crate::sensors::SensorReading;

/// One motion command for the drive unit.
///
/// Speeds are duty-cycle percentages. `hold_ms` on the spin variants is
/// how long the tracking loop should let the correction act before the
/// next sensor read (0 for the mild corrections).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Maneuver {
    /// Halt both wheels.
    Stop,
    /// Both wheels forward at equal speed.
    Straight {
        /// Wheel speed.
        speed: u8,
    },
    /// Right wheel forward, left wheel stopped.
    SoftLeft {
        /// Right wheel speed.
        speed: u8,
    },
    /// Left wheel forward, right wheel stopped.
    SoftRight {
        /// Left wheel speed.
        speed: u8,
    },
    /// Spin in place to the left (left wheel back, right wheel forward).
    SpinLeft {
        /// Wheel speed for both wheels.
        speed: u8,
        /// Hold duration before the next sensor read.
        hold_ms: u64,
    },
    /// Spin in place to the right (left wheel forward, right wheel back).
    SpinRight {
        /// Wheel speed for both wheels.
        speed: u8,
        /// Hold duration before the next sensor read.
        hold_ms: u64,
    },
}

impl Maneuver {
    /// Hold duration the tracking loop should apply after this command.
    pub fn hold_ms(&self) -> u64 {
        match self {
            Maneuver::SpinLeft { hold_ms, .. } | Maneuver::SpinRight { hold_ms, .. } => *hold_ms,
            _ => 0,
        }
    }
}

/// Map one sensor snapshot to a motion command.
///
/// Precedence order (first match wins):
///
/// 1. nothing detected → [`Maneuver::Stop`] (fail-safe)
/// 2. (L1 or L2) and R2 → held sharp spin right
/// 3. L1 and (R1 or R2) → held sharp spin left
/// 4. L1 → mild spin left
/// 5. R2 → mild spin right
/// 6. L2 and not R1 → soft left
/// 7. R1 and not L2 → soft right
/// 8. L2 and R1 → straight ahead
///
/// Rules 1-8 cover every pattern; exactly one fires for each of the 16
/// possible readings.
pub fn decide(reading: SensorReading, cfg: &TrackingConfig) -> Maneuver {
    let SensorReading {
        left_outer: l1,
        left_inner: l2,
        right_inner: r1,
        right_outer: r2,
    } = reading;

    if !(l1 || l2 || r1 || r2) {
        Maneuver::Stop
    } else if (l1 || l2) && r2 {
        Maneuver::SpinRight {
            speed: cfg.sharp_spin_speed,
            hold_ms: cfg.hold_ms,
        }
    } else if l1 && (r1 || r2) {
        Maneuver::SpinLeft {
            speed: cfg.sharp_spin_speed,
            hold_ms: cfg.hold_ms,
        }
    } else if l1 {
        Maneuver::SpinLeft {
            speed: cfg.drift_spin_speed,
            hold_ms: 0,
        }
    } else if r2 {
        Maneuver::SpinRight {
            speed: cfg.drift_spin_speed,
            hold_ms: 0,
        }
    } else if l2 && !r1 {
        Maneuver::SoftLeft {
            speed: cfg.cruise_speed,
        }
    } else if !l2 && r1 {
        Maneuver::SoftRight {
            speed: cfg.cruise_speed,
        }
    } else {
        // Only remaining pattern: both inner sensors on the line.
        Maneuver::Straight {
            speed: cfg.cruise_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(l1: bool, l2: bool, r1: bool, r2: bool) -> SensorReading {
        SensorReading {
            left_outer: l1,
            left_inner: l2,
            right_inner: r1,
            right_outer: r2,
        }
    }

    fn cfg() -> TrackingConfig {
        TrackingConfig::default()
    }

    #[test]
    fn all_clear_stops() {
        assert_eq!(decide(reading(false, false, false, false), &cfg()), Maneuver::Stop);
    }

    #[test]
    fn sharp_corrections_hold() {
        // L2 + R2: drifted hard, spin right with hold
        assert_eq!(
            decide(reading(false, true, false, true), &cfg()),
            Maneuver::SpinRight { speed: 15, hold_ms: 50 }
        );
        // L1 + R1: spin left with hold
        assert_eq!(
            decide(reading(true, false, true, false), &cfg()),
            Maneuver::SpinLeft { speed: 15, hold_ms: 50 }
        );
        // L1 + R2 matches rule 2 before rule 3
        assert_eq!(
            decide(reading(true, false, false, true), &cfg()),
            Maneuver::SpinRight { speed: 15, hold_ms: 50 }
        );
    }

    #[test]
    fn lone_outer_sensor_mild_spin() {
        assert_eq!(
            decide(reading(true, false, false, false), &cfg()),
            Maneuver::SpinLeft { speed: 12, hold_ms: 0 }
        );
        assert_eq!(
            decide(reading(false, false, false, true), &cfg()),
            Maneuver::SpinRight { speed: 12, hold_ms: 0 }
        );
    }

    #[test]
    fn inner_sensor_fine_steering() {
        assert_eq!(
            decide(reading(false, true, false, false), &cfg()),
            Maneuver::SoftLeft { speed: 15 }
        );
        assert_eq!(
            decide(reading(false, false, true, false), &cfg()),
            Maneuver::SoftRight { speed: 15 }
        );
        assert_eq!(
            decide(reading(false, true, true, false), &cfg()),
            Maneuver::Straight { speed: 15 }
        );
    }

    #[test]
    fn hold_only_on_sharp_spins() {
        assert_eq!(decide(reading(false, true, false, true), &cfg()).hold_ms(), 50);
        assert_eq!(decide(reading(true, false, false, false), &cfg()).hold_ms(), 0);
        assert_eq!(decide(reading(false, true, true, false), &cfg()).hold_ms(), 0);
        assert_eq!(Maneuver::Stop.hold_ms(), 0);
    }

    /// Evaluating the guards in order with first-match-wins must be
    /// equivalent to mutually exclusive guards: exactly one rule fires
    /// for each of the 16 patterns.
    #[test]
    fn exactly_one_rule_fires_per_pattern() {
        for bits in 0u8..16 {
            let l1 = bits & 1 != 0;
            let l2 = bits & 2 != 0;
            let r1 = bits & 4 != 0;
            let r2 = bits & 8 != 0;

            // Exclusive forms of the eight guards: each rule AND-ed with
            // the negation of every earlier rule.
            let rule1 = !(l1 || l2 || r1 || r2);
            let rule2 = !rule1 && (l1 || l2) && r2;
            let rule3 = !rule1 && !rule2 && l1 && (r1 || r2);
            let rule4 = !rule1 && !rule2 && !rule3 && l1;
            let rule5 = !rule1 && !rule2 && !rule3 && !rule4 && r2;
            let rule6 = !rule1 && !rule2 && !rule3 && !rule4 && !rule5 && l2 && !r1;
            let rule7 = !rule1 && !rule2 && !rule3 && !rule4 && !rule5 && !rule6 && !l2 && r1;
            let rule8 =
                !rule1 && !rule2 && !rule3 && !rule4 && !rule5 && !rule6 && !rule7 && l2 && r1;

            let fired = [rule1, rule2, rule3, rule4, rule5, rule6, rule7, rule8]
                .iter()
                .filter(|&&g| g)
                .count();
            assert_eq!(fired, 1, "pattern {bits:04b} fired {fired} rules");

            // And decide() agrees with whichever exclusive guard fired.
            let got = decide(reading(l1, l2, r1, r2), &cfg());
            let expected_variant = match [rule1, rule2, rule3, rule4, rule5, rule6, rule7, rule8]
                .iter()
                .position(|&g| g)
            {
                Some(0) => matches!(got, Maneuver::Stop),
                Some(1) => matches!(got, Maneuver::SpinRight { hold_ms: 50, .. }),
                Some(2) => matches!(got, Maneuver::SpinLeft { hold_ms: 50, .. }),
                Some(3) => matches!(got, Maneuver::SpinLeft { hold_ms: 0, .. }),
                Some(4) => matches!(got, Maneuver::SpinRight { hold_ms: 0, .. }),
                Some(5) => matches!(got, Maneuver::SoftLeft { .. }),
                Some(6) => matches!(got, Maneuver::SoftRight { .. }),
                Some(7) => matches!(got, Maneuver::Straight { .. }),
                _ => false,
            };
            assert!(expected_variant, "pattern {bits:04b} decided {got:?}");
        }
    }
}
