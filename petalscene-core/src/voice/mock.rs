//! In-memory voice backend that records every call.
//!
//! Used by the test suite and the demo binary to observe what the scene manager does to
//! its voices without touching an audio device.

use super::{ConeAngle, PhysicalVoice, VoiceBackend, VoiceState};
use crate::buffer::SoundBuffer;
use crate::distance::DistanceModel;
use crate::math::Vec3;
use crate::reverb::{EffectSlot, ReverbEffect, ReverbPreset};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Last known parameters of one mock voice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockVoiceRecord {
    pub linked: Option<String>,
    pub state: VoiceState,
    pub looping: bool,
    pub gain: f32,
    /// Every gain written, in order
    pub gain_history: Vec<f32>,
    pub position: Vec3,
    pub velocity: Vec3,
    pub direction: Vec3,
    pub ref_distance: f32,
    pub max_distance: f32,
    pub distance_model: Option<DistanceModel>,
    pub rolloff_factor: f32,
    pub doppler_factor: f32,
    pub air_absorption_factor: f32,
    pub cone: Option<ConeAngle>,
    pub current_time: f64,
    pub effect_send: Option<EffectSlot>,
    pub play_count: u32,
    pub stop_count: u32,
    /// Number of `set_position` calls, one per parameter refresh
    pub position_updates: u32,
    /// When set, `play` fails and leaves the voice untouched
    pub refuse_play: bool,
}

/// State of the mock reverb slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockReverbRecord {
    pub preset: Option<ReverbPreset>,
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct MockState {
    voices: Vec<MockVoiceRecord>,
    reverb: Option<MockReverbRecord>,
}

/// Shared, inspectable view of everything the mock backend has seen.
#[derive(Debug, Clone, Default)]
pub struct MockVoiceLog {
    state: Arc<Mutex<MockState>>,
}

impl MockVoiceLog {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn voice(&self, index: usize) -> Option<MockVoiceRecord> {
        self.lock().voices.get(index).cloned()
    }

    pub fn voices(&self) -> Vec<MockVoiceRecord> {
        self.lock().voices.clone()
    }

    pub fn playing_count(&self) -> usize {
        self.lock()
            .voices
            .iter()
            .filter(|voice| voice.state == VoiceState::Playing)
            .count()
    }

    /// Simulate the end of a non-looping buffer on voice `index`.
    pub fn finish(&self, index: usize) {
        if let Some(voice) = self.lock().voices.get_mut(index) {
            voice.state = VoiceState::Stopped;
        }
    }

    /// Make `play` on voice `index` fail until switched back.
    pub fn refuse_play(&self, index: usize, refuse: bool) {
        self.with_voice(index, |voice| voice.refuse_play = refuse);
    }

    pub fn reverb(&self) -> Option<MockReverbRecord> {
        self.lock().reverb.clone()
    }

    fn with_voice(&self, index: usize, f: impl FnOnce(&mut MockVoiceRecord)) {
        if let Some(voice) = self.lock().voices.get_mut(index) {
            f(voice);
        }
    }
}

/// Voice backend producing [`MockVoice`]s.
#[derive(Debug, Default)]
pub struct MockBackend {
    log: MockVoiceLog,
    voice_limit: Option<usize>,
    effects: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to create more than `limit` voices.
    pub fn with_voice_limit(mut self, limit: usize) -> Self {
        self.voice_limit = Some(limit);
        self
    }

    /// Report auxiliary effect support.
    pub fn with_effects(mut self, enabled: bool) -> Self {
        self.effects = enabled;
        self
    }

    pub fn log(&self) -> MockVoiceLog {
        self.log.clone()
    }
}

impl VoiceBackend for MockBackend {
    fn create_voice(&mut self) -> Option<Box<dyn PhysicalVoice>> {
        let mut state = self.log.lock();
        if self
            .voice_limit
            .is_some_and(|limit| state.voices.len() >= limit)
        {
            return None;
        }
        let index = state.voices.len();
        state.voices.push(MockVoiceRecord::default());
        drop(state);

        Some(Box::new(MockVoice {
            index,
            log: self.log.clone(),
        }))
    }

    fn supports_effects(&self) -> bool {
        self.effects
    }

    fn create_reverb(&mut self) -> Option<Box<dyn ReverbEffect>> {
        if !self.effects {
            return None;
        }
        self.log.lock().reverb = Some(MockReverbRecord::default());
        Some(Box::new(MockReverb {
            log: self.log.clone(),
        }))
    }
}

/// A voice that only records what it was told.
#[derive(Debug)]
pub struct MockVoice {
    index: usize,
    log: MockVoiceLog,
}

impl PhysicalVoice for MockVoice {
    fn link(&mut self, buffer: &Arc<SoundBuffer>) -> bool {
        let name = buffer.name().to_string();
        self.log.with_voice(self.index, |v| v.linked = Some(name));
        true
    }

    fn unlink(&mut self) {
        self.log.with_voice(self.index, |v| v.linked = None);
    }

    fn play(&mut self, looping: bool) -> bool {
        let mut started = false;
        self.log.with_voice(self.index, |v| {
            if v.refuse_play {
                return;
            }
            v.state = VoiceState::Playing;
            v.looping = looping;
            v.play_count += 1;
            started = true;
        });
        started
    }

    fn stop(&mut self) {
        self.log.with_voice(self.index, |v| {
            v.state = VoiceState::Stopped;
            v.stop_count += 1;
        });
    }

    fn set_gain(&mut self, gain: f32) {
        self.log.with_voice(self.index, |v| {
            v.gain = gain;
            v.gain_history.push(gain);
        });
    }

    fn set_position(&mut self, position: Vec3) {
        self.log.with_voice(self.index, |v| {
            v.position = position;
            v.position_updates += 1;
        });
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.log.with_voice(self.index, |v| v.velocity = velocity);
    }

    fn set_direction(&mut self, direction: Vec3) {
        self.log.with_voice(self.index, |v| v.direction = direction);
    }

    fn set_distance(&mut self, ref_distance: f32, max_distance: f32) {
        self.log.with_voice(self.index, |v| {
            v.ref_distance = ref_distance;
            v.max_distance = max_distance;
        });
    }

    fn set_distance_model(&mut self, model: DistanceModel) {
        self.log
            .with_voice(self.index, |v| v.distance_model = Some(model));
    }

    fn set_rolloff_factor(&mut self, rolloff: f32) {
        self.log.with_voice(self.index, |v| v.rolloff_factor = rolloff);
    }

    fn set_doppler_factor(&mut self, factor: f32) {
        self.log.with_voice(self.index, |v| v.doppler_factor = factor);
    }

    fn set_air_absorption_factor(&mut self, factor: f32) {
        self.log
            .with_voice(self.index, |v| v.air_absorption_factor = factor);
    }

    fn set_cone_angle(&mut self, cone: ConeAngle) {
        self.log.with_voice(self.index, |v| v.cone = Some(cone));
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.log.with_voice(self.index, |v| v.current_time = seconds);
    }

    fn state(&self) -> VoiceState {
        self.log
            .voice(self.index)
            .map(|v| v.state)
            .unwrap_or_default()
    }

    fn set_effect_send(&mut self, slot: Option<EffectSlot>) -> bool {
        self.log.with_voice(self.index, |v| v.effect_send = slot);
        true
    }
}

/// Reverb slot of the mock backend.
#[derive(Debug)]
pub struct MockReverb {
    log: MockVoiceLog,
}

impl ReverbEffect for MockReverb {
    fn slot(&self) -> EffectSlot {
        EffectSlot(1)
    }

    fn apply_preset(&mut self, preset: &ReverbPreset) -> bool {
        if let Some(reverb) = self.log.lock().reverb.as_mut() {
            reverb.preset = Some(*preset);
        }
        true
    }

    fn set_enabled(&mut self, enabled: bool) -> bool {
        if let Some(reverb) = self.log.lock().reverb.as_mut() {
            reverb.enabled = enabled;
        }
        true
    }
}

impl Drop for MockReverb {
    fn drop(&mut self) {
        self.log.lock().reverb = None;
    }
}
