//! Strategy hooks invoked by the scene manager on audibility transitions.
//!
//! All hooks run inside the scene lock during
//! [`SceneManager::update`](crate::SceneManager::update), so they must not call back into
//! the scene manager.

use crate::scene::SourceId;
use crate::source::LogicalSource;

/// Overridable callbacks for application-specific audibility policy.
///
/// Every method has a no-op default, so implementors only override what they need.
///
/// # Example
///
/// ```
/// use petalscene_core::hooks::SceneHooks;
/// use petalscene_core::{LogicalSource, SourceId};
///
/// /// Keeps a looping ambience bed alive forever.
/// struct KeepAlive;
///
/// impl SceneHooks for KeepAlive {
///     fn on_stopped(&mut self, _id: SourceId, _source: &LogicalSource) -> bool {
///         false
///     }
/// }
/// ```
pub trait SceneHooks: Send {
    /// Called with the freshly computed effective gain; the return value replaces it.
    fn on_check_gain(&mut self, _id: SourceId, _source: &LogicalSource, gain: f32) -> f32 {
        gain
    }

    /// The source stopped being audible and started fading out (or lost its voice).
    fn on_to_mute(&mut self, _id: SourceId, _source: &LogicalSource) {}

    /// The source became audible and now holds a voice.
    fn on_to_hear(&mut self, _id: SourceId, _source: &LogicalSource) {}

    fn on_continued_mute(&mut self, _id: SourceId, _source: &LogicalSource) {}

    fn on_continued_hear(&mut self, _id: SourceId, _source: &LogicalSource) {}

    /// Playback reached the end of a non-looping buffer.
    ///
    /// Return `true` to release the voice and end playback, `false` to keep the slot
    /// and restart from the beginning.
    fn on_stopped(&mut self, _id: SourceId, _source: &LogicalSource) -> bool {
        true
    }
}

/// Hooks that change nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl SceneHooks for DefaultHooks {}
