//! Doppler velocity estimation from timestamped position samples.

use crate::math::Vec3;

/// Weight kept from the previous smoothed velocity on every new sample.
pub const VELOCITY_RETENTION: f32 = 0.7;

/// Sample intervals at or below this many seconds are discarded.
pub const MIN_SAMPLE_INTERVAL: f64 = 1.0e-4;

/// Low-pass filtered velocity derived from consecutive positions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityEstimator {
    smoothed: Vec3,
    speed: f32,
}

impl VelocityEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the movement from `(last_pos, last_time)` to `(cur_pos, cur_time)` into the
    /// estimate. Returns `false` without touching state when the interval is too short.
    pub fn sample(&mut self, last_pos: Vec3, last_time: f64, cur_pos: Vec3, cur_time: f64) -> bool {
        let dt = cur_time - last_time;
        if dt <= MIN_SAMPLE_INTERVAL {
            return false;
        }

        let raw = (cur_pos - last_pos) / dt as f32;
        self.smoothed = self.smoothed * VELOCITY_RETENTION + raw * (1.0 - VELOCITY_RETENTION);
        self.speed = raw.length();
        true
    }

    /// Smoothed velocity pushed to the physical voice.
    pub fn velocity(&self) -> Vec3 {
        self.smoothed
    }

    /// Unsmoothed speed of the last accepted sample, used for importance scoring.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_sample_is_thirty_percent_of_raw() {
        let mut estimator = VelocityEstimator::new();
        assert!(estimator.sample(Vec3::ZERO, 0.0, Vec3::new(10.0, 0.0, 0.0), 1.0));
        assert_abs_diff_eq!(estimator.velocity().x, 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(estimator.speed(), 10.0, epsilon = 1e-5);
    }

    #[test]
    fn converges_towards_constant_motion() {
        let mut estimator = VelocityEstimator::new();
        let mut pos = Vec3::ZERO;
        for step in 0..40 {
            let next = pos + Vec3::new(0.0, 0.0, 0.5);
            let t = step as f64 * 0.1;
            estimator.sample(pos, t, next, t + 0.1);
            pos = next;
        }
        assert_abs_diff_eq!(estimator.velocity().z, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn near_duplicate_timestamps_are_ignored() {
        let mut estimator = VelocityEstimator::new();
        assert!(!estimator.sample(Vec3::ZERO, 2.0, Vec3::ONE, 2.0));
        assert!(!estimator.sample(Vec3::ZERO, 2.0, Vec3::ONE, 2.00001));
        assert_eq!(estimator.velocity(), Vec3::ZERO);
        assert_eq!(estimator.speed(), 0.0);
    }
}
