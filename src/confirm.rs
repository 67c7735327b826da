//! Detection-confirmation debounce.
//!
//! Per-frame detections are noisy: a target can flicker in and out
//! across frames. [`ConfirmationTracker`] requires a run of consecutive
//! positive frames before the search counts as successful. A single
//! negative frame resets the counter to zero: no decay, no partial
//! credit.
//!
//! # Example
//!
//! ```rust
//! use trackbot::ConfirmationTracker;
//!
//! let mut tracker = ConfirmationTracker::new(5);
//! for _ in 0..4 {
//!     tracker.observe(true);
//! }
//! tracker.observe(false); // one miss erases the streak
//! assert_eq!(tracker.streak(), 0);
//!
//! for _ in 0..5 {
//!     tracker.observe(true);
//! }
//! assert!(tracker.is_confirmed());
//! ```

use crate::traits::Frame;

/// Counts consecutive positive frames toward a confirmation threshold.
#[derive(Clone, Debug)]
pub struct ConfirmationTracker {
    streak: u32,
    threshold: u32,
}

impl ConfirmationTracker {
    /// Create a tracker requiring `threshold` consecutive positives.
    pub fn new(threshold: u32) -> Self {
        Self {
            streak: 0,
            threshold,
        }
    }

    /// Feed one frame's result: was the target present?
    ///
    /// Returns the streak after the observation.
    pub fn observe(&mut self, target_present: bool) -> u32 {
        if target_present {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
        self.streak
    }

    /// Current consecutive-positive count.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Configured threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// True once the streak has reached the threshold.
    pub fn is_confirmed(&self) -> bool {
        self.streak >= self.threshold
    }
}

/// Terminal outcome of one foreground search.
///
/// Cancellation and abortion are both reported as failure to the
/// caller, but kept distinct for user-visible messaging.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchOutcome {
    /// Target confirmed; carries the confirming frame.
    Confirmed(Frame),
    /// Operator cancelled the search.
    Cancelled,
    /// The frame pipeline failed; no result frame.
    Aborted,
}

impl SearchOutcome {
    /// True only for a confirmed target.
    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Confirmed(_))
    }

    /// The confirming frame, if the search succeeded.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            SearchOutcome::Confirmed(frame) => Some(frame),
            _ => None,
        }
    }
}
