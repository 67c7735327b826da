//! Static configuration for the motion and search subsystems.
//!
//! All values here are fixed at startup, not runtime-negotiated. The
//! defaults are the tuned constants the robot ships with: 500 Hz PWM,
//! a 20 ms tracking cycle, 50 ms held corrections, and a 5-frame
//! detection confirmation threshold.
//!
//! # Example
//!
//! ```rust
//! use trackbot::config::{Config, PwmConfig, TrackingConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.pwm.frequency_hz, 500);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_pwm(PwmConfig::default().with_frequency_hz(1000))
//!     .with_tracking(TrackingConfig::default().with_cruise_speed(20));
//! ```

use heapless::String as HString;

/// Maximum length for detection/target labels.
pub const MAX_LABEL: usize = 32;

/// Type alias for detection and target labels.
pub type Label = HString<MAX_LABEL>;

/// Create a [`Label`] from a `&str`, truncating if too long.
pub fn label(s: &str) -> Label {
    let mut hs = Label::new();
    let take = s.len().min(MAX_LABEL);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete rover configuration.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Software PWM configuration.
    pub pwm: PwmConfig,
    /// Line-tracking loop configuration.
    pub tracking: TrackingConfig,
    /// Visual search configuration.
    pub search: SearchConfig,
}

impl Config {
    /// Set PWM configuration.
    pub fn with_pwm(mut self, pwm: PwmConfig) -> Self {
        self.pwm = pwm;
        self
    }

    /// Set tracking configuration.
    pub fn with_tracking(mut self, tracking: TrackingConfig) -> Self {
        self.tracking = tracking;
        self
    }

    /// Set search configuration.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }
}

// ============================================================================
// PWM Config
// ============================================================================

/// Software PWM configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PwmConfig {
    /// PWM frequency in Hz. Lowered from typical values to reduce motor
    /// noise on small DC gearmotors.
    pub frequency_hz: u32,
    /// Duty cycle applied when a channel starts (0-100).
    pub initial_duty: u8,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 500,
            initial_duty: 30,
        }
    }
}

impl PwmConfig {
    /// Set the PWM frequency.
    pub fn with_frequency_hz(mut self, hz: u32) -> Self {
        self.frequency_hz = hz;
        self
    }

    /// Set the initial duty cycle (clamped to 0-100 when applied).
    pub fn with_initial_duty(mut self, duty: u8) -> Self {
        self.initial_duty = duty;
        self
    }
}

// ============================================================================
// Tracking Config
// ============================================================================

/// Line-tracking loop configuration.
///
/// Speeds are duty-cycle percentages (0-100). The poll period bounds
/// how quickly the loop reacts to line loss or reacquisition; the hold
/// gives a sharp correction time to act before the next sensor read.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackingConfig {
    /// Delay between tracking iterations in milliseconds.
    pub poll_ms: u64,
    /// Hold duration for sharp spin corrections in milliseconds.
    pub hold_ms: u64,
    /// Speed for straight-ahead and soft turns.
    pub cruise_speed: u8,
    /// Speed for mild spin corrections (single outer sensor).
    pub drift_spin_speed: u8,
    /// Speed for held sharp spin corrections.
    pub sharp_spin_speed: u8,
    /// Consecutive faulted sensor reads that force a fail-safe stop.
    pub sensor_fault_limit: u32,
    /// Grace period for the tracking task to stop, in milliseconds.
    /// Exceeding it is fatal: a motor may still be energized.
    pub stop_grace_ms: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poll_ms: 20,
            hold_ms: 50,
            cruise_speed: 15,
            drift_spin_speed: 12,
            sharp_spin_speed: 15,
            sensor_fault_limit: 3,
            stop_grace_ms: 500,
        }
    }
}

impl TrackingConfig {
    /// Set the poll period.
    pub fn with_poll_ms(mut self, ms: u64) -> Self {
        self.poll_ms = ms;
        self
    }

    /// Set the sharp-correction hold duration.
    pub fn with_hold_ms(mut self, ms: u64) -> Self {
        self.hold_ms = ms;
        self
    }

    /// Set the cruise speed.
    pub fn with_cruise_speed(mut self, speed: u8) -> Self {
        self.cruise_speed = speed;
        self
    }

    /// Set the mild spin speed.
    pub fn with_drift_spin_speed(mut self, speed: u8) -> Self {
        self.drift_spin_speed = speed;
        self
    }

    /// Set the sharp spin speed.
    pub fn with_sharp_spin_speed(mut self, speed: u8) -> Self {
        self.sharp_spin_speed = speed;
        self
    }

    /// Set the sensor fault limit.
    pub fn with_sensor_fault_limit(mut self, limit: u32) -> Self {
        self.sensor_fault_limit = limit;
        self
    }

    /// Set the stop grace period.
    pub fn with_stop_grace_ms(mut self, ms: u64) -> Self {
        self.stop_grace_ms = ms;
        self
    }
}

// ============================================================================
// Search Config
// ============================================================================

/// Visual search configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Consecutive positive frames required to confirm the target.
    pub confirmation_threshold: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            confirmation_threshold: 5,
        }
    }
}

impl SearchConfig {
    /// Set the confirmation threshold.
    pub fn with_confirmation_threshold(mut self, frames: u32) -> Self {
        self.confirmation_threshold = frames;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_constants() {
        let config = Config::default();
        assert_eq!(config.pwm.frequency_hz, 500);
        assert_eq!(config.pwm.initial_duty, 30);
        assert_eq!(config.tracking.poll_ms, 20);
        assert_eq!(config.tracking.hold_ms, 50);
        assert_eq!(config.tracking.cruise_speed, 15);
        assert_eq!(config.tracking.drift_spin_speed, 12);
        assert_eq!(config.tracking.sharp_spin_speed, 15);
        assert_eq!(config.search.confirmation_threshold, 5);
    }

    #[test]
    fn builder_chain() {
        let config = Config::default()
            .with_pwm(PwmConfig::default().with_frequency_hz(250).with_initial_duty(0))
            .with_tracking(TrackingConfig::default().with_poll_ms(5).with_hold_ms(10))
            .with_search(SearchConfig::default().with_confirmation_threshold(3));
        assert_eq!(config.pwm.frequency_hz, 250);
        assert_eq!(config.pwm.initial_duty, 0);
        assert_eq!(config.tracking.poll_ms, 5);
        assert_eq!(config.tracking.hold_ms, 10);
        assert_eq!(config.search.confirmation_threshold, 3);
    }

    #[test]
    fn label_truncates_at_utf8_boundary() {
        let exact = label("hammer");
        assert_eq!(exact.as_str(), "hammer");

        // 3 bytes per char; 32 / 3 = 10 full chars fit
        let long = label("游标卡尺游标卡尺游标卡尺游标卡尺");
        assert!(long.len() <= MAX_LABEL);
        assert!(long.as_str().chars().all(|c| "游标卡尺".contains(c)));
    }

    #[test]
    fn label_empty() {
        assert_eq!(label("").as_str(), "");
    }
}
