use crate::error::{PetalSceneError, Result};
use crate::fade::{DEFAULT_FADE_DURATION, DEFAULT_SILENCE_THRESHOLD};
use crate::schedule::ImportanceScale;

/// Configuration descriptor for a PetalScene scene manager
#[derive(Debug, Clone)]
pub struct SceneDesc {
    /// Number of physical voices requested from the backend
    pub max_voices: usize,
    /// Reference distance for sources that do not override it
    pub default_ref_distance: f32,
    /// Maximum distance for sources that do not override it
    pub default_max_distance: f32,
    /// Length of every audibility crossfade, in seconds
    pub fade_duration: f64,
    /// Gain at or below which a finished fade-out releases its voice
    pub silence_threshold: f32,
    /// A stolen voice is only attenuated before stopping if its gain exceeds this
    pub steal_gain_floor: f32,
    /// Multiplier applied to a stolen voice's gain just before it is stopped
    pub steal_attenuation: f32,
    /// Priority that maps to full priority importance
    pub max_expected_priority: f32,
    /// Speed (units per second) that maps to full speed importance
    pub high_speed_threshold: f32,
    /// Events kept for `poll_events` before new ones are dropped
    pub event_capacity: usize,
}

impl Default for SceneDesc {
    fn default() -> Self {
        Self {
            max_voices: 32,
            default_ref_distance: 1.0,
            default_max_distance: 100.0,
            fade_duration: DEFAULT_FADE_DURATION,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            steal_gain_floor: 0.001,
            steal_attenuation: 0.1,
            max_expected_priority: 10.0,
            high_speed_threshold: 20.0,
            event_capacity: 1024,
        }
    }
}

impl SceneDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_voices(mut self, max: usize) -> Self {
        self.max_voices = max;
        self
    }

    pub fn default_distance(mut self, ref_distance: f32, max_distance: f32) -> Self {
        self.default_ref_distance = ref_distance;
        self.default_max_distance = max_distance;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn fade_duration(mut self, seconds: f64) -> Self {
        self.fade_duration = seconds;
        self
    }

    /// Reject descriptors a scene cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(PetalSceneError::InvalidConfiguration(reason));

        if self.max_voices == 0 {
            return invalid("max_voices must be at least 1".to_string());
        }
        if self.default_ref_distance <= 0.0
            || self.default_max_distance <= self.default_ref_distance
        {
            return invalid(format!(
                "default distance range [{}, {}] is malformed",
                self.default_ref_distance, self.default_max_distance
            ));
        }
        if self.fade_duration.is_nan() || self.fade_duration < 0.0 {
            return invalid(format!("fade_duration {} is negative", self.fade_duration));
        }
        if !(0.0..=1.0).contains(&self.steal_attenuation) {
            return invalid(format!(
                "steal_attenuation {} is outside [0, 1]",
                self.steal_attenuation
            ));
        }
        Ok(())
    }

    pub fn importance_scale(&self) -> ImportanceScale {
        ImportanceScale {
            max_expected_priority: self.max_expected_priority,
            high_speed_threshold: self.high_speed_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let desc = SceneDesc::new()
            .max_voices(4)
            .default_distance(2.0, 40.0)
            .fade_duration(0.05);
        assert_eq!(desc.max_voices, 4);
        assert_eq!(desc.default_ref_distance, 2.0);
        assert_eq!(desc.default_max_distance, 40.0);
        assert_eq!(desc.fade_duration, 0.05);
        assert_eq!(desc.steal_attenuation, 0.1);
    }

    #[test]
    fn validate_rejects_unusable_descriptors() {
        assert!(SceneDesc::default().validate().is_ok());
        assert!(matches!(
            SceneDesc::default().max_voices(0).validate(),
            Err(PetalSceneError::InvalidConfiguration(_))
        ));
        assert!(SceneDesc::default().default_distance(5.0, 5.0).validate().is_err());
        assert!(SceneDesc::default().fade_duration(-0.1).validate().is_err());
    }

    #[test]
    fn importance_scale_follows_desc() {
        let desc = SceneDesc {
            max_expected_priority: 5.0,
            ..Default::default()
        };
        assert_eq!(desc.importance_scale().max_expected_priority, 5.0);
        assert_eq!(desc.importance_scale().high_speed_threshold, 20.0);
    }
}
