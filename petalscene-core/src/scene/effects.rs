//! Reverb lifecycle.
//!
//! Effect support is probed once when the scene is created. Without it every operation
//! here returns `false` and leaves voices untouched.

use super::{SceneManager, SceneState};
use crate::events::SceneEvent;
use crate::reverb::{EffectSlot, ReverbEffect, ReverbPreset};

pub(super) struct ReverbState {
    available: bool,
    effect: Option<Box<dyn ReverbEffect>>,
    enabled: bool,
    preset: ReverbPreset,
}

impl ReverbState {
    pub(super) fn new(available: bool) -> Self {
        Self {
            available,
            effect: None,
            enabled: false,
            preset: ReverbPreset::default(),
        }
    }

    pub(super) fn is_available(&self) -> bool {
        self.available
    }

    pub(super) fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Slot newly admitted voices should send into.
    pub(super) fn active_slot(&self) -> Option<EffectSlot> {
        if !self.enabled {
            return None;
        }
        self.effect.as_ref().map(|effect| effect.slot())
    }
}

impl SceneState {
    fn init_reverb(&mut self) -> bool {
        let reverb = &mut self.reverb;
        if !reverb.available {
            log::warn!("Reverb requested but the voice backend has no effect support");
            return false;
        }
        if reverb.effect.is_some() {
            return true;
        }

        let Some(mut effect) = self.backend.create_reverb() else {
            log::warn!("Voice backend failed to create a reverb effect");
            return false;
        };
        if !effect.apply_preset(&reverb.preset) {
            log::warn!("Reverb effect rejected the initial preset");
        }
        reverb.effect = Some(effect);
        log::info!("Reverb initialised");
        true
    }
}

impl SceneManager {
    /// Create the reverb effect and load the current preset.
    ///
    /// Returns `false` if the backend has no effect support. Calling it again once
    /// initialised is a no-op returning `true`.
    pub fn init_reverb(&self) -> bool {
        self.lock().init_reverb()
    }

    /// Detach every voice from the reverb and destroy the effect.
    pub fn close_reverb(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.reverb.effect.is_none() {
            return;
        }

        if state.reverb.enabled {
            for voice in state.pool.in_use_mut() {
                voice.set_effect_send(None);
            }
        }
        state.reverb.enabled = false;
        state.reverb.effect = None;
        log::info!("Reverb closed");
    }

    /// Load a new preset, applying it right away if the effect exists.
    pub fn set_reverb_preset(&self, preset: ReverbPreset) -> bool {
        let mut state = self.lock();
        let reverb = &mut state.reverb;
        if !reverb.available {
            return false;
        }
        if let Err(reason) = preset.validate() {
            log::warn!("Rejected reverb preset: {}", reason);
            return false;
        }

        reverb.preset = preset;
        match reverb.effect.as_mut() {
            Some(effect) => effect.apply_preset(&preset),
            None => true,
        }
    }

    /// Attach (or detach) every held voice to the reverb send. Initialises the effect on
    /// first use.
    pub fn enable_reverb(&self, enabled: bool) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        if enabled && !state.init_reverb() {
            return false;
        }

        let Some(effect) = state.reverb.effect.as_mut() else {
            return false;
        };
        if state.reverb.enabled == enabled {
            return true;
        }
        if !effect.set_enabled(enabled) {
            log::warn!("Reverb effect refused to change state");
            return false;
        }

        let send = enabled.then(|| effect.slot());
        for voice in state.pool.in_use_mut() {
            voice.set_effect_send(send);
        }
        state.reverb.enabled = enabled;
        log::debug!("Reverb {}", if enabled { "enabled" } else { "disabled" });
        state.emit(SceneEvent::ReverbChanged { enabled });
        true
    }

    pub fn is_reverb_enabled(&self) -> bool {
        self.lock().reverb.enabled
    }

    pub fn reverb_preset(&self) -> ReverbPreset {
        self.lock().reverb.preset
    }
}

#[cfg(test)]
mod tests {
    use crate::buffer::SoundBuffer;
    use crate::config::{SceneDesc, SourceConfig};
    use crate::listener::Listener;
    use crate::math::Vec3;
    use crate::reverb::{EffectSlot, ReverbPreset};
    use crate::scene::SceneManager;
    use crate::voice::mock::MockBackend;
    use std::sync::Arc;

    #[test]
    fn unavailable_backend_is_a_permanent_no_op() {
        let scene = SceneManager::new(
            SceneDesc::default(),
            MockBackend::new(),
            Some(Listener::default()),
        );
        assert!(!scene.init_reverb());
        assert!(!scene.set_reverb_preset(ReverbPreset::CAVE));
        assert!(!scene.enable_reverb(true));
        assert!(!scene.is_reverb_enabled());
        scene.close_reverb();
    }

    #[test]
    fn enabling_attaches_held_and_later_voices() {
        let backend = MockBackend::new().with_effects(true);
        let log = backend.log();
        let scene = SceneManager::new(
            SceneDesc::default().max_voices(2),
            backend,
            Some(Listener::default()),
        );
        let buffer = Arc::new(SoundBuffer::with_duration("drip", 48000, 1.0));

        let first = scene
            .create(SourceConfig::new(buffer.clone(), Vec3::X))
            .unwrap();
        scene.play(first).unwrap();
        scene.update(0.0).unwrap();

        assert!(scene.enable_reverb(true));
        assert_eq!(log.voice(0).unwrap().effect_send, Some(EffectSlot(1)));

        let second = scene.create(SourceConfig::new(buffer, Vec3::Y)).unwrap();
        scene.play(second).unwrap();
        scene.update(0.01).unwrap();
        assert_eq!(log.voice(1).unwrap().effect_send, Some(EffectSlot(1)));

        assert!(scene.enable_reverb(false));
        assert_eq!(log.voice(0).unwrap().effect_send, None);
        assert_eq!(log.voice(1).unwrap().effect_send, None);
    }

    #[test]
    fn enable_initialises_the_effect_in_one_call() {
        let backend = MockBackend::new().with_effects(true);
        let log = backend.log();
        let scene = SceneManager::new(SceneDesc::default(), backend, None);

        assert!(scene.enable_reverb(true));
        let reverb = log.reverb().unwrap();
        assert!(reverb.enabled);
        assert_eq!(reverb.preset, Some(ReverbPreset::GENERIC));
    }

    #[test]
    fn concurrent_toggling_keeps_reverb_consistent() {
        let backend = MockBackend::new().with_effects(true);
        let log = backend.log();
        let scene = Arc::new(SceneManager::new(SceneDesc::default(), backend, None));

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let scene = scene.clone();
                std::thread::spawn(move || {
                    for round in 0..200 {
                        if (round + worker) % 3 == 0 {
                            scene.close_reverb();
                        } else {
                            scene.enable_reverb(round % 2 == 0);
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        if scene.is_reverb_enabled() {
            assert!(log.reverb().is_some_and(|reverb| reverb.enabled));
        }
    }

    #[test]
    fn preset_is_applied_to_the_effect() {
        let backend = MockBackend::new().with_effects(true);
        let log = backend.log();
        let scene = SceneManager::new(SceneDesc::default(), backend, None);

        assert!(scene.set_reverb_preset(ReverbPreset::ARENA));
        assert!(scene.init_reverb());
        assert_eq!(log.reverb().unwrap().preset, Some(ReverbPreset::ARENA));

        assert!(scene.set_reverb_preset(ReverbPreset::FOREST));
        assert_eq!(log.reverb().unwrap().preset, Some(ReverbPreset::FOREST));

        scene.close_reverb();
        assert!(log.reverb().is_none());
    }
}
