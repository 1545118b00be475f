//! Importance-based throttling of per-source parameter refreshes.
//!
//! Gain polling runs for every source on every tick. Pushing position, velocity and
//! filter parameters to a physical voice is more expensive, so each source is placed in
//! a refresh tier derived from an importance score in `[0, 1]`.

const GAIN_WEIGHT: f32 = 0.4;
const PRIORITY_WEIGHT: f32 = 0.3;
const SPEED_WEIGHT: f32 = 0.2;
const PROXIMITY_WEIGHT: f32 = 0.1;

/// Inputs to the importance score of one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportanceInputs {
    pub audible_gain: f32,
    pub priority: f32,
    pub speed: f32,
    pub doppler_factor: f32,
    pub distance: f32,
    pub max_distance: f32,
}

/// Normalisation constants for the importance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportanceScale {
    pub max_expected_priority: f32,
    pub high_speed_threshold: f32,
}

impl Default for ImportanceScale {
    fn default() -> Self {
        Self {
            max_expected_priority: 10.0,
            high_speed_threshold: 20.0,
        }
    }
}

/// Weighted blend of gain, priority, speed and proximity, in `[0, 1]`.
///
/// Speed only counts for sources with doppler enabled.
pub fn importance(inputs: &ImportanceInputs, scale: &ImportanceScale) -> f32 {
    let gain = ratio(inputs.audible_gain, 1.0);
    let priority = ratio(inputs.priority, scale.max_expected_priority);
    let speed = if inputs.doppler_factor > 0.0 {
        ratio(inputs.speed, scale.high_speed_threshold)
    } else {
        0.0
    };
    let proximity = 1.0 - ratio(inputs.distance, inputs.max_distance);

    GAIN_WEIGHT * gain
        + PRIORITY_WEIGHT * priority
        + SPEED_WEIGHT * speed
        + PROXIMITY_WEIGHT * proximity
}

fn ratio(value: f32, limit: f32) -> f32 {
    if limit <= 0.0 || value.is_nan() {
        return if value > 0.0 { 1.0 } else { 0.0 };
    }
    (value / limit).clamp(0.0, 1.0)
}

/// Refresh tier of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateTier {
    EveryFrame,
    EveryOtherFrame,
    EveryFifthFrame,
}

impl UpdateTier {
    pub fn from_importance(importance: f32) -> Self {
        if importance >= 0.6 {
            Self::EveryFrame
        } else if importance >= 0.3 {
            Self::EveryOtherFrame
        } else {
            Self::EveryFifthFrame
        }
    }

    /// Frames between two refreshes.
    pub fn interval(&self) -> u32 {
        match self {
            Self::EveryFrame => 1,
            Self::EveryOtherFrame => 2,
            Self::EveryFifthFrame => 5,
        }
    }
}

/// Frames elapsed from `earlier` to `now` on a wrapping `u32` counter.
pub fn frames_since(now: u32, earlier: u32) -> u32 {
    now.wrapping_sub(earlier)
}

/// Whether a source last refreshed at `last_update_frame` is due at `frame`.
pub fn is_due(frame: u32, last_update_frame: u32, tier: UpdateTier) -> bool {
    frames_since(frame, last_update_frame) >= tier.interval()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn inputs() -> ImportanceInputs {
        ImportanceInputs {
            audible_gain: 0.0,
            priority: 0.0,
            speed: 0.0,
            doppler_factor: 0.0,
            distance: 100.0,
            max_distance: 100.0,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let all_maxed = ImportanceInputs {
            audible_gain: 2.0,
            priority: 50.0,
            speed: 100.0,
            doppler_factor: 1.0,
            distance: 0.0,
            max_distance: 100.0,
        };
        assert_abs_diff_eq!(
            importance(&all_maxed, &ImportanceScale::default()),
            1.0,
            epsilon = 1e-6
        );
        assert_eq!(importance(&inputs(), &ImportanceScale::default()), 0.0);
    }

    #[test]
    fn speed_ignored_without_doppler() {
        let scale = ImportanceScale::default();
        let fast = ImportanceInputs {
            speed: 40.0,
            ..inputs()
        };
        assert_eq!(importance(&fast, &scale), 0.0);

        let fast_doppler = ImportanceInputs {
            doppler_factor: 1.0,
            ..fast
        };
        assert_abs_diff_eq!(importance(&fast_doppler, &scale), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn tier_thresholds() {
        assert_eq!(UpdateTier::from_importance(0.65).interval(), 1);
        assert_eq!(UpdateTier::from_importance(0.6).interval(), 1);
        assert_eq!(UpdateTier::from_importance(0.45).interval(), 2);
        assert_eq!(UpdateTier::from_importance(0.3).interval(), 2);
        assert_eq!(UpdateTier::from_importance(0.1).interval(), 5);
    }

    #[test]
    fn due_check_survives_counter_wrap() {
        let last = u32::MAX - 1;
        assert!(!is_due(u32::MAX, last, UpdateTier::EveryOtherFrame));
        assert!(is_due(0, last, UpdateTier::EveryOtherFrame));
        assert!(!is_due(2, last, UpdateTier::EveryFifthFrame));
        assert!(is_due(3, last, UpdateTier::EveryFifthFrame));
    }
}
