//! Playback buffer descriptors.
//!
//! The scene manager never touches sample data. A [`SoundBuffer`] only describes what a
//! physical voice links against, and its duration is what start offsets wrap around.

use std::time::Duration;

/// Descriptor of a decoded, linkable playback buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundBuffer {
    name: String,
    sample_rate: u32,
    frame_count: usize,
    channels: u16,
}

impl SoundBuffer {
    pub fn new(
        name: impl Into<String>,
        sample_rate: u32,
        frame_count: usize,
        channels: u16,
    ) -> Self {
        Self {
            name: name.into(),
            sample_rate,
            frame_count,
            channels,
        }
    }

    /// Convenience constructor for a buffer of the given length in seconds.
    pub fn with_duration(name: impl Into<String>, sample_rate: u32, seconds: f64) -> Self {
        let frame_count = (seconds.max(0.0) * sample_rate as f64).round() as usize;
        Self::new(name, sample_rate, frame_count, 1)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Playback length in seconds. Zero when the sample rate is zero.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frame_count as f64 / self.sample_rate as f64
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs())
    }
}
