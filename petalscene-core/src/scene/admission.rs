//! Voice admission and stealing.

use super::{SceneState, SourceId};
use crate::events::SceneEvent;
use crate::voice::VoiceId;

impl SceneState {
    /// A free voice for `id`, or one stolen from a lower scored source.
    pub(super) fn acquire_voice(&mut self, id: SourceId, gain: f32) -> Option<VoiceId> {
        self.pool.acquire().or_else(|| self.steal_for(id, gain))
    }

    /// Take the voice of the lowest scored holder if it scores strictly below the
    /// requester. A holder's score is its last audible gain times its priority.
    fn steal_for(&mut self, thief: SourceId, gain: f32) -> Option<VoiceId> {
        let thief_score = gain * self.sources.get(thief)?.priority;

        let (victim, victim_score) = self
            .sources
            .iter()
            .filter(|(id, source)| *id != thief && source.voice.is_some())
            .map(|(id, source)| (id, source.last_gain * source.priority))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        if victim_score >= thief_score {
            log::trace!(
                "Source {} (score {:.4}) cannot steal from {} (score {:.4})",
                thief,
                thief_score,
                victim,
                victim_score
            );
            return None;
        }

        let floor = self.desc.steal_gain_floor;
        let attenuation = self.desc.steal_attenuation;
        let source = &mut self.sources[victim];
        let voice_id = source.voice.take()?;

        if let Some(voice) = self.pool.get_mut(voice_id) {
            if source.applied_gain > floor {
                voice.set_gain(source.applied_gain * attenuation);
            }
            voice.stop();
            voice.unlink();
            if self.reverb.is_enabled() {
                voice.set_effect_send(None);
            }
        }
        source.fade = None;
        source.last_gain = 0.0;
        source.applied_gain = 0.0;

        log::debug!(
            "Source {} stole voice {} from source {} (score {:.4} > {:.4})",
            thief,
            voice_id,
            victim,
            thief_score,
            victim_score
        );
        self.hooks.on_to_mute(victim, &self.sources[victim]);
        self.emit(SceneEvent::VoiceStolen {
            victim,
            thief,
            voice: voice_id,
        });
        Some(voice_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::buffer::SoundBuffer;
    use crate::config::{SceneDesc, SourceConfig};
    use crate::events::SceneEvent;
    use crate::listener::Listener;
    use crate::math::Vec3;
    use crate::scene::SceneManager;
    use crate::voice::mock::MockBackend;
    use std::sync::Arc;

    fn config(gain: f32, priority: f32) -> SourceConfig {
        let buffer = Arc::new(SoundBuffer::with_duration("loop", 48000, 2.0));
        SourceConfig::new(buffer, Vec3::new(0.5, 0.0, 0.0))
            .gain(gain)
            .priority(priority)
            .looping(true)
    }

    fn single_voice_scene() -> SceneManager {
        SceneManager::new(
            SceneDesc::default().max_voices(1),
            MockBackend::new(),
            Some(Listener::at(Vec3::ZERO)),
        )
    }

    #[test]
    fn steals_from_lowest_score() {
        let scene = single_voice_scene();
        let quiet = scene.create(config(0.5, 1.0)).unwrap();
        scene.play(quiet).unwrap();
        scene.update(0.0).unwrap();

        let loud = scene.create(config(0.8, 2.0)).unwrap();
        scene.play(loud).unwrap();
        scene.poll_events();
        scene.update(0.01).unwrap();

        assert!(scene.source(quiet).unwrap().voice().is_none());
        assert!(scene.source(loud).unwrap().voice().is_some());
        assert!(scene.poll_events().iter().any(|event| matches!(
            event,
            SceneEvent::VoiceStolen { victim, thief, .. } if *victim == quiet && *thief == loud
        )));
    }

    #[test]
    fn equal_score_does_not_steal() {
        let scene = single_voice_scene();
        let first = scene.create(config(0.5, 1.0)).unwrap();
        scene.play(first).unwrap();
        scene.update(0.0).unwrap();

        let second = scene.create(config(0.5, 1.0)).unwrap();
        scene.play(second).unwrap();
        scene.update(0.01).unwrap();

        assert!(scene.source(first).unwrap().voice().is_some());
        assert!(scene.source(second).unwrap().voice().is_none());
        assert_eq!(scene.source(second).unwrap().last_gain(), 0.0);
    }
}
