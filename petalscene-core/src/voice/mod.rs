//! Physical voice capability interface.
//!
//! A physical voice is one hardware or API backed playback channel. The scene manager
//! never creates sound itself: it links buffers to voices, starts and stops them, and
//! pushes spatial parameters through [`PhysicalVoice`]. Voices come from a
//! [`VoiceBackend`] once, at scene construction, and live in a fixed [`VoicePool`].

pub mod mock;
mod pool;

use crate::buffer::SoundBuffer;
use crate::distance::DistanceModel;
use crate::math::Vec3;
use crate::reverb::{EffectSlot, ReverbEffect};
use std::sync::Arc;

pub use pool::VoicePool;

/// Index of a voice slot inside a [`VoicePool`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub(crate) usize);

impl VoiceId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VoiceId({})", self.0)
    }
}

/// Playback state reported by a physical voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// Directional emission cone, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeAngle {
    pub inner_degrees: f32,
    pub outer_degrees: f32,
    /// Gain multiplier applied outside the outer cone
    pub outer_gain: f32,
}

impl ConeAngle {
    /// Omnidirectional emission.
    pub const OMNI: Self = Self {
        inner_degrees: 360.0,
        outer_degrees: 360.0,
        outer_gain: 0.0,
    };

    pub fn new(inner_degrees: f32, outer_degrees: f32, outer_gain: f32) -> Self {
        Self {
            inner_degrees,
            outer_degrees,
            outer_gain,
        }
    }
}

impl Default for ConeAngle {
    fn default() -> Self {
        Self::OMNI
    }
}

/// One playback channel provided by the audio backend.
///
/// Every setter must be non-blocking: they are called while the scene lock is held.
pub trait PhysicalVoice: Send {
    /// Attach a playback buffer. Returns `false` if the backend rejects it.
    fn link(&mut self, buffer: &Arc<SoundBuffer>) -> bool;
    fn unlink(&mut self);

    fn play(&mut self, looping: bool) -> bool;
    fn stop(&mut self);

    fn set_gain(&mut self, gain: f32);
    fn set_position(&mut self, position: Vec3);
    fn set_velocity(&mut self, velocity: Vec3);
    fn set_direction(&mut self, direction: Vec3);

    fn set_distance(&mut self, ref_distance: f32, max_distance: f32);
    fn set_distance_model(&mut self, model: DistanceModel);
    fn set_rolloff_factor(&mut self, rolloff: f32);
    fn set_doppler_factor(&mut self, factor: f32);
    fn set_air_absorption_factor(&mut self, factor: f32);
    fn set_cone_angle(&mut self, cone: ConeAngle);

    /// Seek within the linked buffer, in seconds.
    fn set_current_time(&mut self, seconds: f64);
    fn state(&self) -> VoiceState;

    /// Route the voice into an auxiliary effect slot, or detach it with `None`.
    ///
    /// Backends without effect support keep the default, which reports failure.
    fn set_effect_send(&mut self, _slot: Option<EffectSlot>) -> bool {
        false
    }
}

/// Factory for physical voices and, optionally, a reverb effect.
pub trait VoiceBackend: Send {
    /// Create one voice, or `None` once the backend is out of channels.
    fn create_voice(&mut self) -> Option<Box<dyn PhysicalVoice>>;

    /// Whether the auxiliary effect extension is present. Queried once per scene.
    fn supports_effects(&self) -> bool {
        false
    }

    fn create_reverb(&mut self) -> Option<Box<dyn ReverbEffect>> {
        None
    }
}
