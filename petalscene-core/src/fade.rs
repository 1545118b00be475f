//! Linear gain ramps used on audibility transitions.

/// Default ramp length in seconds.
pub const DEFAULT_FADE_DURATION: f64 = 0.02;

/// Gain at or below which a completed ramp counts as silence.
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 1.0e-4;

/// A fixed-duration linear ramp from `start_gain` to `target_gain`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossfade {
    pub start_time: f64,
    pub duration: f64,
    pub start_gain: f32,
    pub target_gain: f32,
}

impl Crossfade {
    pub fn new(start_time: f64, duration: f64, start_gain: f32, target_gain: f32) -> Self {
        Self {
            start_time,
            duration,
            start_gain,
            target_gain,
        }
    }

    /// Fraction of the ramp covered at `time`, in `[0, 1]`.
    pub fn progress(&self, time: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((time - self.start_time) / self.duration).clamp(0.0, 1.0) as f32
    }

    /// Ramp gain at `time`. Exactly `target_gain` once the ramp has run its course.
    pub fn gain_at(&self, time: f64) -> f32 {
        let progress = self.progress(time);
        if progress >= 1.0 {
            return self.target_gain;
        }
        self.start_gain + (self.target_gain - self.start_gain) * progress
    }

    pub fn is_complete(&self, time: f64) -> bool {
        time - self.start_time >= self.duration
    }

    /// True for a ramp heading to silence.
    pub fn is_fade_out(&self, silence_threshold: f32) -> bool {
        self.target_gain <= silence_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn halfway_gain_is_the_midpoint() {
        let fade = Crossfade::new(3.0, DEFAULT_FADE_DURATION, 0.0, 0.5);
        assert_abs_diff_eq!(fade.gain_at(3.01), 0.25, epsilon = 1e-5);

        let down = Crossfade::new(1.0, 0.5, 0.8, 0.2);
        assert_abs_diff_eq!(down.gain_at(1.25), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn ramp_is_clamped_outside_its_window() {
        let fade = Crossfade::new(1.0, 0.02, 0.2, 1.0);
        assert_eq!(fade.gain_at(0.5), 0.2);
        assert_eq!(fade.gain_at(2.0), 1.0);
        assert!(!fade.is_complete(1.01));
        assert!(fade.is_complete(1.02));
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let fade = Crossfade::new(0.0, 0.0, 1.0, 0.0);
        assert_eq!(fade.gain_at(0.0), 0.0);
        assert!(fade.is_complete(0.0));
        assert!(fade.is_fade_out(DEFAULT_SILENCE_THRESHOLD));
    }
}
