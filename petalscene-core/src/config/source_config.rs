use crate::buffer::SoundBuffer;
use crate::distance::DistanceModel;
use crate::math::Vec3;
use crate::voice::ConeAngle;
use std::sync::Arc;

/// Everything needed to create a logical source.
///
/// A source without a buffer is rejected by
/// [`SceneManager::create`](crate::SceneManager::create).
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub buffer: Option<Arc<SoundBuffer>>,
    pub position: Vec3,
    pub direction: Vec3,
    /// Authored base gain (0.0 = silent, 1.0 = full)
    pub gain: f32,
    pub distance_model: DistanceModel,
    pub rolloff_factor: f32,
    /// Overrides the scene's default reference distance
    pub ref_distance: Option<f32>,
    /// Overrides the scene's default maximum distance
    pub max_distance: Option<f32>,
    /// 0.0 disables doppler estimation for this source
    pub doppler_factor: f32,
    pub air_absorption_factor: f32,
    pub cone_angle: ConeAngle,
    /// Weight used by voice stealing and importance scheduling
    pub priority: f32,
    pub looping: bool,
    /// Absolute scene time at which playback begins; 0.0 starts on first audibility
    pub start_play_time: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            buffer: None,
            position: Vec3::ZERO,
            direction: Vec3::ZERO,
            gain: 1.0,
            distance_model: DistanceModel::default(),
            rolloff_factor: 1.0,
            ref_distance: None,
            max_distance: None,
            doppler_factor: 0.0,
            air_absorption_factor: 0.0,
            cone_angle: ConeAngle::OMNI,
            priority: 1.0,
            looping: false,
            start_play_time: 0.0,
        }
    }
}

impl SourceConfig {
    /// A source playing `buffer` at `position` with default parameters.
    pub fn new(buffer: Arc<SoundBuffer>, position: Vec3) -> Self {
        Self {
            buffer: Some(buffer),
            position,
            ..Default::default()
        }
    }

    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn priority(mut self, priority: f32) -> Self {
        self.priority = priority;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn distance_model(mut self, model: DistanceModel) -> Self {
        self.distance_model = model;
        self
    }

    pub fn rolloff_factor(mut self, rolloff: f32) -> Self {
        self.rolloff_factor = rolloff;
        self
    }

    /// Override the scene's default distance range.
    pub fn distance(mut self, ref_distance: f32, max_distance: f32) -> Self {
        self.ref_distance = Some(ref_distance);
        self.max_distance = Some(max_distance);
        self
    }

    pub fn doppler_factor(mut self, factor: f32) -> Self {
        self.doppler_factor = factor;
        self
    }

    pub fn air_absorption_factor(mut self, factor: f32) -> Self {
        self.air_absorption_factor = factor;
        self
    }

    pub fn direction(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }

    pub fn cone_angle(mut self, cone: ConeAngle) -> Self {
        self.cone_angle = cone;
        self
    }

    pub fn start_play_time(mut self, time: f64) -> Self {
        self.start_play_time = time;
        self
    }

    /// Returns true if a playback buffer is attached
    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_buffer() {
        let config = SourceConfig::default();
        assert!(!config.has_buffer());
        assert_eq!(config.gain, 1.0);
        assert_eq!(config.distance_model, DistanceModel::InverseDistanceClamped);
    }

    #[test]
    fn builder_sets_overrides() {
        let buffer = Arc::new(SoundBuffer::with_duration("engine", 48000, 1.0));
        let config = SourceConfig::new(buffer, Vec3::X)
            .gain(0.5)
            .priority(3.0)
            .distance(2.0, 20.0)
            .looping(true);
        assert!(config.has_buffer());
        assert_eq!(config.ref_distance, Some(2.0));
        assert_eq!(config.max_distance, Some(20.0));
        assert_eq!(config.priority, 3.0);
        assert!(config.looping);
    }
}
