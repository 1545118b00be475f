//! The scene manager.
//!
//! [`SceneManager`] owns the logical source registry, the fixed voice pool, the listener
//! and the scene clock. Every public operation takes the single scene lock for its whole
//! duration, so calls from several threads are safe and serialise. Nothing inside the
//! lock blocks: the only outside calls are non-blocking voice parameter setters.

mod admission;
mod effects;
mod update;

use crate::config::{SceneDesc, SourceConfig};
use crate::error::{PetalSceneError, Result};
use crate::events::SceneEvent;
use crate::hooks::{DefaultHooks, SceneHooks};
use crate::listener::Listener;
use crate::math::{Pose, Vec3};
use crate::source::LogicalSource;
use crate::voice::{VoiceBackend, VoicePool};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use effects::ReverbState;
use slotmap::SlotMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

slotmap::new_key_type! {
    /// Lightweight, type-safe handle for logical sources.
    ///
    /// Returned by [`SceneManager::create`]. A handle stays invalid forever once its
    /// source is deleted, even if the slot is reused.
    pub struct SourceId;
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceId({:?})", self.0)
    }
}

/// Point-in-time counters of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStats {
    pub sources: usize,
    pub voices_in_use: usize,
    pub voice_capacity: usize,
    /// Sources with a positive gain after the last update
    pub audible: usize,
    pub frame: u32,
}

pub(crate) struct SceneState {
    desc: SceneDesc,
    sources: SlotMap<SourceId, LogicalSource>,
    pool: VoicePool,
    backend: Box<dyn VoiceBackend>,
    listener: Option<Listener>,
    hooks: Box<dyn SceneHooks>,
    reverb: ReverbState,
    cur_time: f64,
    frame: u32,
    audible: usize,
    events: Sender<SceneEvent>,
}

impl SceneState {
    /// Queue an event for `poll_events`, dropping it if nobody has drained the queue.
    fn emit(&self, event: SceneEvent) {
        if let Err(TrySendError::Full(event) | TrySendError::Disconnected(event)) =
            self.events.try_send(event)
        {
            log::trace!("Event queue full, dropped {:?}", event);
        }
    }

    fn source_mut(&mut self, id: SourceId) -> Result<&mut LogicalSource> {
        self.sources
            .get_mut(id)
            .ok_or(PetalSceneError::UnknownSource(id))
    }
}

/// Real-time 3D audio scene manager.
///
/// Decides every tick which logical sources are audible, admits them onto a fixed pool of
/// physical voices (stealing from lower scored sources when the pool is exhausted),
/// crossfades audibility transitions and keeps the spatial parameters of held voices in
/// sync on an importance-based schedule.
///
/// # Example
///
/// ```
/// use petalscene_core::voice::mock::MockBackend;
/// use petalscene_core::*;
/// use std::sync::Arc;
///
/// let scene = SceneManager::new(
///     SceneDesc::default().max_voices(8),
///     MockBackend::new(),
///     Some(Listener::at(Vec3::ZERO)),
/// );
///
/// let buffer = Arc::new(SoundBuffer::with_duration("footstep", 48000, 0.4));
/// let id = scene
///     .create(SourceConfig::new(buffer, Vec3::new(2.0, 0.0, 0.0)))
///     .expect("buffer attached");
/// scene.play(id)?;
///
/// assert_eq!(scene.update(0.0)?, 1);
/// # Ok::<(), PetalSceneError>(())
/// ```
pub struct SceneManager {
    state: Mutex<SceneState>,
    event_receiver: Receiver<SceneEvent>,
}

impl SceneManager {
    /// Create a scene with up to `desc.max_voices` voices taken from `backend`.
    pub fn new(
        desc: SceneDesc,
        backend: impl VoiceBackend + 'static,
        listener: Option<Listener>,
    ) -> Self {
        let mut backend: Box<dyn VoiceBackend> = Box::new(backend);
        let pool = VoicePool::new(backend.as_mut(), desc.max_voices);
        let reverb = ReverbState::new(backend.supports_effects());
        let (events, event_receiver) = crossbeam_channel::bounded(desc.event_capacity.max(1));

        log::info!(
            "Scene created with {} voices (effects available: {})",
            pool.capacity(),
            reverb.is_available()
        );

        Self {
            state: Mutex::new(SceneState {
                desc,
                sources: SlotMap::with_key(),
                pool,
                backend,
                listener,
                hooks: Box::new(DefaultHooks),
                reverb,
                cur_time: 0.0,
                frame: 0,
                audible: 0,
                events,
            }),
            event_receiver,
        }
    }

    /// Like [`SceneManager::new`], but rejects an invalid descriptor and a backend that
    /// could not create a single voice.
    pub fn try_new(
        desc: SceneDesc,
        backend: impl VoiceBackend + 'static,
        listener: Option<Listener>,
    ) -> Result<Self> {
        desc.validate()?;
        let scene = Self::new(desc, backend, listener);
        if scene.lock().pool.capacity() == 0 {
            return Err(PetalSceneError::Backend(
                "voice backend created no voices".to_string(),
            ));
        }
        Ok(scene)
    }

    fn lock(&self) -> MutexGuard<'_, SceneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the transition hooks.
    pub fn set_hooks(&self, hooks: impl SceneHooks + 'static) {
        self.lock().hooks = Box::new(hooks);
    }

    /// Register a new source. Returns `None` if the config carries no buffer.
    pub fn create(&self, config: SourceConfig) -> Option<SourceId> {
        let mut state = self.lock();
        let Some(source) = LogicalSource::from_config(config, state.desc.silence_threshold) else {
            log::debug!("Rejected source without a playback buffer");
            return None;
        };

        let buffer_name = source.buffer().name().to_string();
        let id = state.sources.insert(source);
        log::debug!("Created source {} ({})", id, buffer_name);
        Some(id)
    }

    /// Remove a source, releasing its voice immediately.
    pub fn delete(&self, id: SourceId) -> Result<()> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if !state.sources.contains_key(id) {
            return Err(PetalSceneError::UnknownSource(id));
        }
        state.release_voice(id);
        state.sources.remove(id);
        log::debug!("Deleted source {}", id);
        Ok(())
    }

    /// Remove every source, releasing all voices.
    pub fn clear(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let ids: Vec<SourceId> = state.sources.keys().collect();
        for id in &ids {
            state.release_voice(*id);
        }
        state.sources.clear();
        state.audible = 0;
        log::info!("Cleared {} sources", ids.len());
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.lock().sources.contains_key(id)
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.lock().sources.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().sources.is_empty()
    }

    /// A copy of the source's current state.
    pub fn source(&self, id: SourceId) -> Option<LogicalSource> {
        self.lock().sources.get(id).cloned()
    }

    /// Run `f` on the source under the scene lock.
    pub fn with_source_mut<R>(
        &self,
        id: SourceId,
        f: impl FnOnce(&mut LogicalSource) -> R,
    ) -> Result<R> {
        let mut state = self.lock();
        Ok(f(state.source_mut(id)?))
    }

    pub fn play(&self, id: SourceId) -> Result<()> {
        self.with_source_mut(id, LogicalSource::play)
    }

    pub fn play_at(&self, id: SourceId, start_time: f64) -> Result<()> {
        self.with_source_mut(id, |source| source.play_at(start_time))
    }

    pub fn stop(&self, id: SourceId) -> Result<()> {
        self.with_source_mut(id, LogicalSource::stop)
    }

    pub fn move_to(&self, id: SourceId, position: Vec3, time: f64) -> Result<()> {
        self.with_source_mut(id, |source| source.move_to(position, time))
    }

    pub fn set_direction(&self, id: SourceId, direction: Vec3) -> Result<()> {
        self.with_source_mut(id, |source| source.set_direction(direction))
    }

    pub fn set_gain(&self, id: SourceId, gain: f32) -> Result<()> {
        self.with_source_mut(id, |source| source.set_gain(gain))
    }

    pub fn set_priority(&self, id: SourceId, priority: f32) -> Result<()> {
        self.with_source_mut(id, |source| source.set_priority(priority))
    }

    pub fn set_looping(&self, id: SourceId, looping: bool) -> Result<()> {
        self.with_source_mut(id, |source| source.set_looping(looping))
    }

    /// Replace the listener. `None` is ignored.
    pub fn set_listener(&self, listener: Option<Listener>) {
        if let Some(listener) = listener {
            self.lock().listener = Some(listener);
        }
    }

    /// Move the listener, attaching one if the scene has none.
    pub fn set_listener_pose(&self, pose: Pose) {
        let mut state = self.lock();
        match state.listener.as_mut() {
            Some(listener) => listener.set_pose(pose),
            None => state.listener = Some(Listener::new(pose)),
        }
    }

    pub fn listener(&self) -> Option<Listener> {
        self.lock().listener
    }

    /// Default distance range for sources that do not override it.
    pub fn set_distance(&self, ref_distance: f32, max_distance: f32) {
        let mut state = self.lock();
        if ref_distance <= 0.0 || max_distance <= ref_distance {
            log::warn!(
                "Default distance range [{}, {}] is malformed; sources using it will be silent",
                ref_distance,
                max_distance
            );
        }
        state.desc.default_ref_distance = ref_distance;
        state.desc.default_max_distance = max_distance;
    }

    /// Advance the scene to `current_time` (seconds).
    ///
    /// Returns the number of audible sources, or [`PetalSceneError::NoListener`] when no
    /// listener is attached.
    pub fn update(&self, current_time: f64) -> Result<usize> {
        self.lock().tick(current_time)
    }

    /// Drain every event emitted since the last call.
    ///
    /// At most `SceneDesc::event_capacity` events are kept between calls; newer events
    /// are dropped once the queue is full.
    pub fn poll_events(&self) -> Vec<SceneEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Number of events waiting in the queue.
    pub fn pending_events(&self) -> usize {
        self.event_receiver.len()
    }

    pub fn stats(&self) -> SceneStats {
        let state = self.lock();
        SceneStats {
            sources: state.sources.len(),
            voices_in_use: state.pool.in_use(),
            voice_capacity: state.pool.capacity(),
            audible: state.audible,
            frame: state.frame,
        }
    }

    pub fn current_time(&self) -> f64 {
        self.lock().cur_time
    }
}

impl Drop for SceneManager {
    fn drop(&mut self) {
        self.clear();
        self.close_reverb();
    }
}
