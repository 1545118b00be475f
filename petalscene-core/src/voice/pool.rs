use super::{PhysicalVoice, VoiceBackend, VoiceId};

struct VoiceSlot {
    voice: Box<dyn PhysicalVoice>,
    in_use: bool,
}

/// Fixed-capacity arena of physical voices.
///
/// Voices are created up front and never destroyed while the pool lives. Handing a voice
/// from one source to another is a matter of moving its [`VoiceId`]; the pool itself only
/// tracks which slots are free.
pub struct VoicePool {
    slots: Vec<VoiceSlot>,
    free: Vec<VoiceId>,
}

impl VoicePool {
    /// Fill the pool with up to `capacity` voices from `backend`.
    pub fn new(backend: &mut dyn VoiceBackend, capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            match backend.create_voice() {
                Some(voice) => slots.push(VoiceSlot {
                    voice,
                    in_use: false,
                }),
                None => break,
            }
        }

        if slots.len() < capacity {
            log::warn!(
                "Voice backend created {} of {} requested voices",
                slots.len(),
                capacity
            );
        }

        // Reversed so that acquisition hands out the lowest index first
        let free = (0..slots.len()).rev().map(VoiceId).collect();
        Self { slots, free }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn acquire(&mut self) -> Option<VoiceId> {
        let id = self.free.pop()?;
        self.slots[id.0].in_use = true;
        Some(id)
    }

    /// Return a voice to the pool. Releasing a free or unknown slot is a no-op that
    /// returns `false`.
    pub fn release(&mut self, id: VoiceId) -> bool {
        match self.slots.get_mut(id.0) {
            Some(slot) if slot.in_use => {
                slot.in_use = false;
                self.free.push(id);
                true
            }
            _ => false,
        }
    }

    pub fn is_in_use(&self, id: VoiceId) -> bool {
        self.slots.get(id.0).is_some_and(|slot| slot.in_use)
    }

    pub fn get_mut(&mut self, id: VoiceId) -> Option<&mut dyn PhysicalVoice> {
        let slot = self.slots.get_mut(id.0)?;
        let voice: &mut dyn PhysicalVoice = slot.voice.as_mut();
        Some(voice)
    }

    /// Every voice currently handed out.
    pub fn in_use_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn PhysicalVoice>> {
        self.slots
            .iter_mut()
            .filter(|slot| slot.in_use)
            .map(|slot| &mut slot.voice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::mock::MockBackend;

    #[test]
    fn acquires_lowest_index_first() {
        let mut backend = MockBackend::new();
        let mut pool = VoicePool::new(&mut backend, 3);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.acquire(), Some(VoiceId(0)));
        assert_eq!(pool.acquire(), Some(VoiceId(1)));
        assert_eq!(pool.in_use(), 2);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn exhausts_then_recovers() {
        let mut backend = MockBackend::new();
        let mut pool = VoicePool::new(&mut backend, 1);
        let id = pool.acquire().unwrap();
        assert!(pool.acquire().is_none());
        assert!(pool.release(id));
        assert!(!pool.release(id));
        assert_eq!(pool.acquire(), Some(id));
    }

    #[test]
    fn short_backend_shrinks_capacity() {
        let mut backend = MockBackend::new().with_voice_limit(2);
        let pool = VoicePool::new(&mut backend, 8);
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut backend = MockBackend::new();
        let mut pool = VoicePool::new(&mut backend, 1);
        assert!(!pool.release(VoiceId(7)));
        assert!(pool.get_mut(VoiceId(7)).is_none());
        assert!(!pool.is_in_use(VoiceId(0)));
    }
}
