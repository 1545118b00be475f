pub mod buffer;
pub mod config;
pub mod distance;
pub mod doppler;
pub mod error;
pub mod events;
pub mod fade;
pub mod hooks;
pub mod listener;
pub mod math;
pub mod reverb;
pub mod scene;
pub mod schedule;
pub mod source;
pub mod voice;

pub use buffer::SoundBuffer;
pub use config::{SceneDesc, SourceConfig};
pub use distance::{Attenuation, DistanceModel};
pub use error::PetalSceneError;
pub use events::SceneEvent;
pub use hooks::{DefaultHooks, SceneHooks};
pub use listener::Listener;
pub use math::{Pose, Quat, Vec3};
pub use reverb::{EffectSlot, ReverbPreset};
pub use scene::{SceneManager, SceneStats, SourceId};
pub use source::{LogicalSource, SourceState};
pub use voice::{ConeAngle, VoiceId, VoiceState};
