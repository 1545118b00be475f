//! Event types for PetalScene

use crate::scene::SourceId;
use crate::voice::VoiceId;

/// Notifications emitted by the scene manager during updates and lifecycle calls.
///
/// Drained with [`SceneManager::poll_events`](crate::SceneManager::poll_events).
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A source acquired a voice and started fading in
    SourceHeard { source_id: SourceId, voice: VoiceId },
    /// A source became inaudible and started fading out
    SourceMuted { source_id: SourceId },
    /// `thief` took `voice` away from `victim`
    VoiceStolen {
        victim: SourceId,
        thief: SourceId,
        voice: VoiceId,
    },
    /// A voice went back to the pool
    VoiceReleased { source_id: SourceId, voice: VoiceId },
    /// Playback of a non-looping source ran past the end of its buffer
    SourceFinished { source_id: SourceId },
    ReverbChanged { enabled: bool },
}

impl SceneEvent {
    pub fn source_id(&self) -> Option<SourceId> {
        match self {
            Self::SourceHeard { source_id, .. }
            | Self::SourceMuted { source_id }
            | Self::VoiceReleased { source_id, .. }
            | Self::SourceFinished { source_id } => Some(*source_id),
            Self::VoiceStolen { thief, .. } => Some(*thief),
            Self::ReverbChanged { .. } => None,
        }
    }

    pub fn is_source_event(&self) -> bool {
        self.source_id().is_some()
    }
}
