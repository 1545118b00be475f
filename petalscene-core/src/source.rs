//! Logical sound sources.
//!
//! A [`LogicalSource`] describes an emitter in the scene independently of any hardware
//! resource. It borrows a physical voice only while it is audible (or fading out) and is
//! owned exclusively by the [`SceneManager`](crate::SceneManager) registry.

use crate::buffer::SoundBuffer;
use crate::config::SourceConfig;
use crate::distance::{Attenuation, DistanceModel};
use crate::doppler::VelocityEstimator;
use crate::fade::Crossfade;
use crate::math::Vec3;
use crate::voice::{ConeAngle, VoiceId};
use std::sync::Arc;

/// Where a source stands in the audibility state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// No voice held
    Silent,
    /// Voice held, steady or fading in
    Playing,
    /// Voice held, gain ramping to silence
    FadingOut,
}

/// Scene-level sound emitter.
///
/// Mutators are only reachable through the scene lock, either via the
/// [`SceneManager`](crate::SceneManager) wrappers or
/// [`SceneManager::with_source_mut`](crate::SceneManager::with_source_mut).
#[derive(Debug, Clone)]
pub struct LogicalSource {
    pub(crate) buffer: Arc<SoundBuffer>,

    pub(crate) last_pos: Vec3,
    pub(crate) last_time: f64,
    pub(crate) cur_pos: Vec3,
    pub(crate) cur_time: f64,
    pub(crate) moved: bool,
    pub(crate) velocity: VelocityEstimator,
    pub(crate) direction: Vec3,

    pub(crate) is_play: bool,
    pub(crate) looping: bool,
    pub(crate) start_play_time: f64,

    pub(crate) gain: f32,
    pub(crate) distance_model: DistanceModel,
    pub(crate) rolloff_factor: f32,
    pub(crate) ref_distance: Option<f32>,
    pub(crate) max_distance: Option<f32>,
    pub(crate) doppler_factor: f32,
    pub(crate) air_absorption_factor: f32,
    pub(crate) cone_angle: ConeAngle,

    pub(crate) priority: f32,
    pub(crate) last_gain: f32,
    pub(crate) last_update_frame: u32,

    pub(crate) fade: Option<Crossfade>,
    /// Ramps ending at or below this gain are fade-outs
    pub(crate) silence_threshold: f32,
    /// Gain last written to the voice
    pub(crate) applied_gain: f32,

    pub(crate) voice: Option<VoiceId>,
}

impl LogicalSource {
    /// Build a source from `config`. Returns `None` when no buffer is attached.
    pub(crate) fn from_config(config: SourceConfig, silence_threshold: f32) -> Option<Self> {
        let buffer = config.buffer?;
        Some(Self {
            buffer,
            last_pos: config.position,
            last_time: 0.0,
            cur_pos: config.position,
            cur_time: 0.0,
            moved: false,
            velocity: VelocityEstimator::new(),
            direction: config.direction,
            is_play: false,
            looping: config.looping,
            start_play_time: config.start_play_time,
            gain: config.gain,
            distance_model: config.distance_model,
            rolloff_factor: config.rolloff_factor,
            ref_distance: config.ref_distance,
            max_distance: config.max_distance,
            doppler_factor: config.doppler_factor,
            air_absorption_factor: config.air_absorption_factor,
            cone_angle: config.cone_angle,
            priority: config.priority,
            last_gain: 0.0,
            last_update_frame: 0,
            fade: None,
            silence_threshold,
            applied_gain: 0.0,
            voice: None,
        })
    }

    /// Request playback. Starts on first audibility unless a start time was scheduled.
    pub fn play(&mut self) {
        self.is_play = true;
    }

    /// Request playback beginning at absolute scene time `start_time`.
    pub fn play_at(&mut self, start_time: f64) {
        self.start_play_time = start_time;
        self.is_play = true;
    }

    /// Request silence. A held voice fades out on the next update and is then released.
    pub fn stop(&mut self) {
        self.is_play = false;
        self.start_play_time = 0.0;
    }

    /// Playback ran off the end of the buffer. A later `play` starts from the top.
    pub(crate) fn finish_playback(&mut self) {
        self.is_play = false;
        self.start_play_time = 0.0;
    }

    /// Record a new timestamped position sample.
    pub fn move_to(&mut self, position: Vec3, time: f64) {
        self.last_pos = self.cur_pos;
        self.last_time = self.cur_time;
        self.cur_pos = position;
        self.cur_time = time;
        self.moved = true;
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction;
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    pub fn set_priority(&mut self, priority: f32) {
        self.priority = priority;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_distance_model(&mut self, model: DistanceModel) {
        self.distance_model = model;
    }

    /// Override the scene's default distance range for this source.
    pub fn set_distance(&mut self, ref_distance: f32, max_distance: f32) {
        self.ref_distance = Some(ref_distance);
        self.max_distance = Some(max_distance);
    }

    pub fn state(&self) -> SourceState {
        match (&self.voice, &self.fade) {
            (None, _) => SourceState::Silent,
            (Some(_), Some(fade)) if fade.is_fade_out(self.silence_threshold) => {
                SourceState::FadingOut
            }
            (Some(_), _) => SourceState::Playing,
        }
    }

    pub fn buffer(&self) -> &Arc<SoundBuffer> {
        &self.buffer
    }

    pub fn position(&self) -> Vec3 {
        self.cur_pos
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub fn is_playing(&self) -> bool {
        self.is_play
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn start_play_time(&self) -> f64 {
        self.start_play_time
    }

    /// Effective gain computed on the previous update.
    pub fn last_gain(&self) -> f32 {
        self.last_gain
    }

    /// Gain last written to the physical voice, fades included.
    pub fn applied_gain(&self) -> f32 {
        self.applied_gain
    }

    pub fn voice(&self) -> Option<VoiceId> {
        self.voice
    }

    pub fn fade(&self) -> Option<&Crossfade> {
        self.fade.as_ref()
    }

    pub fn smoothed_velocity(&self) -> Vec3 {
        self.velocity.velocity()
    }

    pub fn move_speed(&self) -> f32 {
        self.velocity.speed()
    }

    pub fn last_update_frame(&self) -> u32 {
        self.last_update_frame
    }

    pub fn doppler_factor(&self) -> f32 {
        self.doppler_factor
    }

    /// Distance parameters, falling back to the scene defaults where not overridden.
    pub fn attenuation(&self, default_ref: f32, default_max: f32) -> Attenuation {
        Attenuation {
            model: self.distance_model,
            rolloff_factor: self.rolloff_factor,
            ref_distance: self.ref_distance.unwrap_or(default_ref),
            max_distance: self.max_distance.unwrap_or(default_max),
        }
    }

    /// Fold pending movement into the doppler estimate.
    pub(crate) fn sample_velocity(&mut self) {
        if !self.moved {
            return;
        }
        self.moved = false;
        if self.doppler_factor > 0.0 && self.cur_pos != self.last_pos {
            self.velocity
                .sample(self.last_pos, self.last_time, self.cur_pos, self.cur_time);
        }
    }

    /// Velocity pushed to the voice: the smoothed estimate, or zero with doppler off.
    pub(crate) fn voice_velocity(&self) -> Vec3 {
        if self.doppler_factor > 0.0 {
            self.velocity.velocity()
        } else {
            Vec3::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fade::DEFAULT_SILENCE_THRESHOLD;

    fn source() -> LogicalSource {
        let buffer = Arc::new(SoundBuffer::with_duration("loop", 48000, 2.0));
        LogicalSource::from_config(
            SourceConfig::new(buffer, Vec3::ZERO).doppler_factor(1.0),
            DEFAULT_SILENCE_THRESHOLD,
        )
        .unwrap()
    }

    #[test]
    fn rejects_missing_buffer() {
        let config = SourceConfig::default();
        assert!(LogicalSource::from_config(config, DEFAULT_SILENCE_THRESHOLD).is_none());
    }

    #[test]
    fn move_to_shifts_samples() {
        let mut src = source();
        src.move_to(Vec3::X, 1.0);
        src.move_to(Vec3::new(3.0, 0.0, 0.0), 1.5);
        assert_eq!(src.last_pos, Vec3::X);
        assert_eq!(src.last_time, 1.0);
        assert_eq!(src.position(), Vec3::new(3.0, 0.0, 0.0));

        src.sample_velocity();
        assert!((src.move_speed() - 4.0).abs() < 1e-5);
        assert!(!src.moved);
    }

    #[test]
    fn no_velocity_without_doppler() {
        let mut src = source();
        src.doppler_factor = 0.0;
        src.move_to(Vec3::X, 1.0);
        src.sample_velocity();
        assert_eq!(src.move_speed(), 0.0);
        assert_eq!(src.voice_velocity(), Vec3::ZERO);
    }

    #[test]
    fn stop_clears_schedule() {
        let mut src = source();
        src.play_at(4.0);
        assert!(src.is_playing());
        assert_eq!(src.start_play_time(), 4.0);
        src.stop();
        assert!(!src.is_playing());
        assert_eq!(src.start_play_time(), 0.0);
    }

    #[test]
    fn attenuation_uses_scene_defaults() {
        let mut src = source();
        let att = src.attenuation(2.0, 50.0);
        assert_eq!((att.ref_distance, att.max_distance), (2.0, 50.0));
        src.set_distance(1.0, 10.0);
        let att = src.attenuation(2.0, 50.0);
        assert_eq!((att.ref_distance, att.max_distance), (1.0, 10.0));
    }

    #[test]
    fn silent_without_voice() {
        assert_eq!(source().state(), SourceState::Silent);
    }

    #[test]
    fn ramp_below_silence_threshold_is_fading_out() {
        let mut src = source();
        src.voice = Some(VoiceId(0));
        src.fade = Some(Crossfade::new(0.0, 0.02, 1.0, DEFAULT_SILENCE_THRESHOLD * 0.5));
        assert_eq!(src.state(), SourceState::FadingOut);

        src.fade = Some(Crossfade::new(0.0, 0.02, 0.0, 0.5));
        assert_eq!(src.state(), SourceState::Playing);
    }

    #[test]
    fn finished_playback_restarts_from_the_top() {
        let mut src = source();
        src.play_at(1.0);
        src.finish_playback();
        assert!(!src.is_playing());
        assert_eq!(src.start_play_time(), 0.0);
    }
}
