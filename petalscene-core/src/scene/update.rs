//! Per-tick audibility state machine.

use super::{SceneState, SourceId};
use crate::distance::compute_gain;
use crate::error::{PetalSceneError, Result};
use crate::events::SceneEvent;
use crate::fade::Crossfade;
use crate::math::Vec3;
use crate::schedule::{ImportanceInputs, UpdateTier, importance, is_due};
use crate::voice::{VoiceId, VoiceState};

impl SceneState {
    pub(super) fn tick(&mut self, current_time: f64) -> Result<usize> {
        let listener = self
            .listener
            .as_ref()
            .map(|listener| listener.position())
            .ok_or(PetalSceneError::NoListener)?;

        self.cur_time = current_time;
        self.frame = self.frame.wrapping_add(1);

        let ids: Vec<SourceId> = self.sources.keys().collect();
        for id in ids {
            self.tick_source(id, listener);
        }

        self.audible = self
            .sources
            .values()
            .filter(|source| source.last_gain > 0.0)
            .count();
        Ok(self.audible)
    }

    fn tick_source(&mut self, id: SourceId, listener: Vec3) {
        let Some(source) = self.sources.get_mut(id) else {
            return;
        };
        source.sample_velocity();

        if !source.is_play {
            let was_audible = source.last_gain > 0.0;
            source.last_gain = 0.0;
            if was_audible {
                self.to_mute(id);
            } else {
                self.begin_fade_out(id);
            }
            self.drive_fade(id);
            return;
        }

        let gain = self.effective_gain(id, listener);
        let gain = self.hooks.on_check_gain(id, &self.sources[id], gain);
        let last_gain = self.sources[id].last_gain;

        let gain = if gain <= 0.0 {
            if last_gain > 0.0 {
                self.to_mute(id);
            } else {
                self.hooks.on_continued_mute(id, &self.sources[id]);
            }
            0.0
        } else if last_gain <= 0.0 {
            if self.to_hear(id, gain) { gain } else { 0.0 }
        } else {
            self.continued_hear(id, gain, listener)
        };

        if let Some(source) = self.sources.get_mut(id) {
            source.last_gain = gain;
        }
        self.drive_fade(id);
    }

    /// Distance attenuation times authored gain.
    fn effective_gain(&self, id: SourceId, listener: Vec3) -> f32 {
        let source = &self.sources[id];
        let attenuation = source.attenuation(
            self.desc.default_ref_distance,
            self.desc.default_max_distance,
        );
        compute_gain(listener, source.cur_pos, source.gain, &attenuation) * source.gain
    }

    fn to_mute(&mut self, id: SourceId) {
        if self.begin_fade_out(id) {
            log::debug!("Source {} fading out", id);
            self.hooks.on_to_mute(id, &self.sources[id]);
            self.emit(SceneEvent::SourceMuted { source_id: id });
        }
    }

    /// Start a ramp to silence if the source holds a voice and is not already fading out.
    fn begin_fade_out(&mut self, id: SourceId) -> bool {
        let now = self.cur_time;
        let duration = self.desc.fade_duration;
        let threshold = self.desc.silence_threshold;
        let source = &mut self.sources[id];

        if source.voice.is_none() {
            return false;
        }
        if source.fade.is_some_and(|fade| fade.is_fade_out(threshold)) {
            return false;
        }
        source.fade = Some(Crossfade::new(now, duration, source.applied_gain, 0.0));
        true
    }

    /// Resolve the start offset, acquire a voice and begin fading in.
    fn to_hear(&mut self, id: SourceId, gain: f32) -> bool {
        let now = self.cur_time;
        let duration = self.desc.fade_duration;

        // Still holding a voice from a fade-out: turn the ramp around
        if self.sources[id].voice.is_some() {
            let source = &mut self.sources[id];
            source.fade = Some(Crossfade::new(now, duration, source.applied_gain, source.gain));
            log::debug!("Source {} re-heard while fading out", id);
            self.hooks.on_to_hear(id, &self.sources[id]);
            return true;
        }

        let Some(offset) = self.resolve_start_offset(id) else {
            return false;
        };

        let Some(voice_id) = self.acquire_voice(id, gain) else {
            log::debug!("Source {} audible but no voice available", id);
            return false;
        };

        let frame = self.frame;
        let reverb_slot = self.reverb.active_slot();
        let source = &mut self.sources[id];
        let Some(voice) = self.pool.get_mut(voice_id) else {
            return false;
        };

        if !voice.link(&source.buffer) {
            log::warn!("Voice {} rejected buffer {}", voice_id, source.buffer.name());
            self.pool.release(voice_id);
            return false;
        }

        let attenuation = source.attenuation(
            self.desc.default_ref_distance,
            self.desc.default_max_distance,
        );
        voice.set_distance_model(attenuation.model);
        voice.set_rolloff_factor(attenuation.rolloff_factor);
        voice.set_distance(attenuation.ref_distance, attenuation.max_distance);
        voice.set_doppler_factor(source.doppler_factor);
        voice.set_air_absorption_factor(source.air_absorption_factor);
        voice.set_cone_angle(source.cone_angle);
        voice.set_position(source.cur_pos);
        voice.set_direction(source.direction);
        voice.set_velocity(source.voice_velocity());
        if let Some(slot) = reverb_slot {
            voice.set_effect_send(Some(slot));
        }

        // The ramp exists before the first gain write, so the voice starts silent
        let fade = Crossfade::new(now, duration, 0.0, source.gain);
        source.fade = Some(fade);
        source.applied_gain = fade.gain_at(now);
        voice.set_gain(source.applied_gain);
        voice.set_current_time(offset);

        if !voice.play(source.looping) {
            log::warn!("Voice {} failed to start for source {}", voice_id, id);
            voice.unlink();
            source.fade = None;
            source.applied_gain = 0.0;
            self.pool.release(voice_id);
            return false;
        }

        source.voice = Some(voice_id);
        source.last_update_frame = frame;

        log::debug!(
            "Source {} heard on voice {} at offset {:.3}s",
            id,
            voice_id,
            offset
        );
        self.hooks.on_to_hear(id, &self.sources[id]);
        self.emit(SceneEvent::SourceHeard {
            source_id: id,
            voice: voice_id,
        });
        true
    }

    /// Playback offset into the buffer at the current time, or `None` if the source is
    /// scheduled in the future or has already finished.
    fn resolve_start_offset(&mut self, id: SourceId) -> Option<f64> {
        let now = self.cur_time;
        let source = &mut self.sources[id];

        if source.start_play_time <= 0.0 {
            source.start_play_time = now;
        }
        if source.start_play_time > now {
            return None;
        }

        let offset = now - source.start_play_time;
        let length = source.buffer.duration_secs();
        if offset < length {
            return Some(offset);
        }
        if source.looping {
            return Some(if length > 0.0 { offset % length } else { 0.0 });
        }

        if self.hooks.on_stopped(id, &self.sources[id]) {
            log::debug!("Source {} finished before becoming audible", id);
            self.sources[id].finish_playback();
            self.emit(SceneEvent::SourceFinished { source_id: id });
            None
        } else {
            self.sources[id].start_play_time = now;
            Some(0.0)
        }
    }

    fn continued_hear(&mut self, id: SourceId, gain: f32, listener: Vec3) -> f32 {
        let Some(voice_id) = self.sources[id].voice else {
            return if self.to_hear(id, gain) { gain } else { 0.0 };
        };

        let stopped = self
            .pool
            .get_mut(voice_id)
            .is_some_and(|voice| voice.state() == VoiceState::Stopped);
        if stopped && !self.handle_stopped(id, voice_id) {
            return 0.0;
        }

        self.hooks.on_continued_hear(id, &self.sources[id]);

        let source = &self.sources[id];
        let attenuation = source.attenuation(
            self.desc.default_ref_distance,
            self.desc.default_max_distance,
        );
        let score = importance(
            &ImportanceInputs {
                audible_gain: gain,
                priority: source.priority,
                speed: source.move_speed(),
                doppler_factor: source.doppler_factor,
                distance: listener.distance(source.cur_pos),
                max_distance: attenuation.max_distance,
            },
            &self.desc.importance_scale(),
        );
        let tier = UpdateTier::from_importance(score);
        if is_due(self.frame, source.last_update_frame, tier) {
            self.refresh(id, voice_id);
        }
        gain
    }

    /// End-of-buffer handling. Returns `true` if the source keeps its voice.
    fn handle_stopped(&mut self, id: SourceId, voice_id: VoiceId) -> bool {
        if self.hooks.on_stopped(id, &self.sources[id]) {
            log::debug!("Source {} finished playback", id);
            self.release_voice(id);
            self.sources[id].finish_playback();
            self.emit(SceneEvent::SourceFinished { source_id: id });
            return false;
        }

        let now = self.cur_time;
        let source = &mut self.sources[id];
        source.start_play_time = now;
        let restarted = self.pool.get_mut(voice_id).is_some_and(|voice| {
            voice.set_current_time(0.0);
            voice.play(source.looping)
        });
        if !restarted {
            log::warn!("Voice {} failed to restart for source {}", voice_id, id);
            self.release_voice(id);
            return false;
        }
        true
    }

    /// Push the per-frame spatial parameters of a held voice.
    fn refresh(&mut self, id: SourceId, voice_id: VoiceId) {
        let frame = self.frame;
        let attenuation = self.sources[id].attenuation(
            self.desc.default_ref_distance,
            self.desc.default_max_distance,
        );
        let source = &mut self.sources[id];
        if let Some(voice) = self.pool.get_mut(voice_id) {
            voice.set_position(source.cur_pos);
            voice.set_direction(source.direction);
            voice.set_velocity(source.voice_velocity());
            voice.set_distance(attenuation.ref_distance, attenuation.max_distance);
        }
        source.last_update_frame = frame;
    }

    /// Apply the current ramp to the voice and retire it once complete.
    fn drive_fade(&mut self, id: SourceId) {
        let now = self.cur_time;
        let duration = self.desc.fade_duration;
        let threshold = self.desc.silence_threshold;
        let Some(source) = self.sources.get_mut(id) else {
            return;
        };
        let Some(voice_id) = source.voice else {
            source.fade = None;
            return;
        };

        // Authored gain changed while steady: ramp to it instead of jumping
        if source.fade.is_none() && source.is_play && source.applied_gain != source.gain {
            source.fade = Some(Crossfade::new(now, duration, source.applied_gain, source.gain));
        }
        let Some(fade) = source.fade else {
            return;
        };

        source.applied_gain = fade.gain_at(now);
        if let Some(voice) = self.pool.get_mut(voice_id) {
            voice.set_gain(source.applied_gain);
        }

        if fade.is_complete(now) {
            source.fade = None;
            if fade.is_fade_out(threshold) {
                log::debug!("Source {} fade-out complete", id);
                self.release_voice(id);
            }
        }
    }

    /// Stop, unlink and return the source's voice to the pool.
    pub(super) fn release_voice(&mut self, id: SourceId) {
        let Some(source) = self.sources.get_mut(id) else {
            return;
        };
        let Some(voice_id) = source.voice.take() else {
            return;
        };
        source.fade = None;
        source.applied_gain = 0.0;

        if let Some(voice) = self.pool.get_mut(voice_id) {
            voice.stop();
            voice.unlink();
            if self.reverb.is_enabled() {
                voice.set_effect_send(None);
            }
        }
        self.pool.release(voice_id);
        self.emit(SceneEvent::VoiceReleased {
            source_id: id,
            voice: voice_id,
        });
    }
}
