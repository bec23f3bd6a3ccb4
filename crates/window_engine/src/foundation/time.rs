//! Time management utilities
//!
//! The backend exposes a raw monotonic tick counter and its frequency. The
//! engine clock turns those ticks into seconds relative to a rebasable origin.

use crate::error::{EngineError, EngineResult};

/// Largest time accepted by [`Clock::set_seconds`], roughly `u64::MAX` nanoseconds
pub const MAX_TIME_SECONDS: f64 = 18_446_744_073.0;

/// Rebasable tick clock
///
/// Seconds are computed as `(ticks - offset) / frequency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    offset: u64,
    frequency: u64,
}

impl Clock {
    /// Create a clock whose origin is `now` ticks
    pub fn new(now: u64, frequency: u64) -> Self {
        Self {
            offset: now,
            frequency: frequency.max(1),
        }
    }

    /// Ticks per second
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Tick value that corresponds to zero seconds
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Seconds elapsed at tick value `now`
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds(&self, now: u64) -> f64 {
        now.wrapping_sub(self.offset) as f64 / self.frequency as f64
    }

    /// Rebase the clock so that tick value `now` reads as `seconds`
    ///
    /// Rejects NaN, negative and absurdly large values without touching the clock.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn set_seconds(&mut self, now: u64, seconds: f64) -> EngineResult<()> {
        if seconds.is_nan() || seconds < 0.0 || seconds > MAX_TIME_SECONDS {
            return Err(EngineError::InvalidValue(format!("Invalid time {seconds}")).logged());
        }

        let ticks = (seconds * self.frequency as f64) as u64;
        self.offset = now.wrapping_sub(ticks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_seconds_from_origin() {
        let clock = Clock::new(1_000, 1_000);
        assert_relative_eq!(clock.seconds(1_000), 0.0);
        assert_relative_eq!(clock.seconds(3_500), 2.5);
    }

    #[test]
    fn test_set_seconds_rebases() {
        let mut clock = Clock::new(500, 1_000_000);
        clock.set_seconds(10_000_000, 42.25).unwrap();
        assert_relative_eq!(clock.seconds(10_000_000), 42.25, epsilon = 1e-6);
        assert_relative_eq!(clock.seconds(11_000_000), 43.25, epsilon = 1e-6);
    }

    #[test]
    fn test_set_seconds_rejects_bad_values() {
        let mut clock = Clock::new(7, 100);
        assert!(clock.set_seconds(10, f64::NAN).is_err());
        assert!(clock.set_seconds(10, -1.0).is_err());
        assert!(clock.set_seconds(10, MAX_TIME_SECONDS * 2.0).is_err());
        assert_eq!(clock.offset(), 7);
    }

    #[test]
    fn test_zero_frequency_is_clamped() {
        let clock = Clock::new(0, 0);
        assert_eq!(clock.frequency(), 1);
    }
}
