//! Environmental reverb presets and the auxiliary effect interface.
//!
//! Reverb is an optional backend capability. When the backend reports no effect support,
//! every reverb operation on the scene becomes a permanent no-op returning `false`.
//!
//! # Example
//!
//! ```
//! use petalscene_core::reverb::ReverbPreset;
//!
//! let hall = ReverbPreset::CONCERT_HALL;
//! assert!(hall.validate().is_ok());
//!
//! let custom = ReverbPreset {
//!     decay_time: 2.5,
//!     ..ReverbPreset::ROOM
//! };
//! assert!(custom.validate().is_ok());
//! ```

/// Handle of an auxiliary effect slot that voices can send into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectSlot(pub u32);

/// Parameters of a standard (EFX style) reverb.
///
/// Gains are linear multipliers, times are in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbPreset {
    /// Modal density of the late reverb (0.0 - 1.0)
    pub density: f32,
    /// Echo density of the late reverb (0.0 - 1.0)
    pub diffusion: f32,
    /// Master wet gain (0.0 - 1.0)
    pub gain: f32,
    /// High frequency attenuation of the wet signal (0.0 - 1.0)
    pub gain_hf: f32,
    /// Late reverb decay time (0.1 - 20.0)
    pub decay_time: f32,
    /// High to mid frequency decay ratio (0.1 - 2.0)
    pub decay_hf_ratio: f32,
    /// Early reflections gain (0.0 - 3.16)
    pub reflections_gain: f32,
    /// Early reflections delay (0.0 - 0.3)
    pub reflections_delay: f32,
    /// Late reverb gain (0.0 - 10.0)
    pub late_reverb_gain: f32,
    /// Late reverb delay after early reflections (0.0 - 0.1)
    pub late_reverb_delay: f32,
    /// High frequency air absorption per metre (0.892 - 1.0)
    pub air_absorption_gain_hf: f32,
}

impl ReverbPreset {
    /// Neutral medium-sized space
    pub const GENERIC: Self = Self {
        density: 1.0,
        diffusion: 1.0,
        gain: 0.3162,
        gain_hf: 0.8913,
        decay_time: 1.49,
        decay_hf_ratio: 0.83,
        reflections_gain: 0.0500,
        reflections_delay: 0.007,
        late_reverb_gain: 1.2589,
        late_reverb_delay: 0.011,
        air_absorption_gain_hf: 0.9943,
    };

    /// Small furnished room, short decay
    pub const ROOM: Self = Self {
        density: 0.4287,
        diffusion: 1.0,
        gain: 0.3162,
        gain_hf: 0.5929,
        decay_time: 0.4,
        decay_hf_ratio: 0.83,
        reflections_gain: 0.1503,
        reflections_delay: 0.002,
        late_reverb_gain: 1.0629,
        late_reverb_delay: 0.003,
        air_absorption_gain_hf: 0.9943,
    };

    /// Large hall with a long, warm tail
    pub const CONCERT_HALL: Self = Self {
        density: 1.0,
        diffusion: 1.0,
        gain: 0.3162,
        gain_hf: 0.5623,
        decay_time: 3.92,
        decay_hf_ratio: 0.70,
        reflections_gain: 0.2427,
        reflections_delay: 0.020,
        late_reverb_gain: 0.9977,
        late_reverb_delay: 0.029,
        air_absorption_gain_hf: 0.9943,
    };

    /// Rock cave, bright reflections
    pub const CAVE: Self = Self {
        density: 1.0,
        diffusion: 1.0,
        gain: 0.3162,
        gain_hf: 1.0,
        decay_time: 2.91,
        decay_hf_ratio: 1.30,
        reflections_gain: 0.5003,
        reflections_delay: 0.015,
        late_reverb_gain: 0.7063,
        late_reverb_delay: 0.022,
        air_absorption_gain_hf: 0.9943,
    };

    /// Stadium-sized enclosure, very long decay
    pub const ARENA: Self = Self {
        density: 1.0,
        diffusion: 1.0,
        gain: 0.3162,
        gain_hf: 0.4477,
        decay_time: 7.24,
        decay_hf_ratio: 0.33,
        reflections_gain: 0.2612,
        reflections_delay: 0.020,
        late_reverb_gain: 1.0186,
        late_reverb_delay: 0.030,
        air_absorption_gain_hf: 0.9943,
    };

    /// Submerged listener, heavy high frequency loss
    pub const UNDERWATER: Self = Self {
        density: 0.3645,
        diffusion: 1.0,
        gain: 0.3162,
        gain_hf: 0.0100,
        decay_time: 1.49,
        decay_hf_ratio: 0.10,
        reflections_gain: 0.5963,
        reflections_delay: 0.007,
        late_reverb_gain: 7.0795,
        late_reverb_delay: 0.011,
        air_absorption_gain_hf: 0.9943,
    };

    /// Open forest, sparse and diffuse
    pub const FOREST: Self = Self {
        density: 0.3,
        diffusion: 0.3,
        gain: 0.3162,
        gain_hf: 0.0224,
        decay_time: 1.49,
        decay_hf_ratio: 0.54,
        reflections_gain: 0.0525,
        reflections_delay: 0.162,
        late_reverb_gain: 0.7682,
        late_reverb_delay: 0.088,
        air_absorption_gain_hf: 0.9943,
    };

    /// Looks up a built-in preset by case-insensitive name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "generic" => Some(Self::GENERIC),
            "room" => Some(Self::ROOM),
            "concert_hall" | "hall" => Some(Self::CONCERT_HALL),
            "cave" => Some(Self::CAVE),
            "arena" => Some(Self::ARENA),
            "underwater" => Some(Self::UNDERWATER),
            "forest" => Some(Self::FOREST),
            _ => None,
        }
    }

    /// Validates that every parameter is inside its documented range
    pub fn validate(&self) -> Result<(), &'static str> {
        let checks = [
            (self.density, 0.0, 1.0, "Density must be between 0.0 and 1.0"),
            (self.diffusion, 0.0, 1.0, "Diffusion must be between 0.0 and 1.0"),
            (self.gain, 0.0, 1.0, "Gain must be between 0.0 and 1.0"),
            (self.gain_hf, 0.0, 1.0, "Gain HF must be between 0.0 and 1.0"),
            (self.decay_time, 0.1, 20.0, "Decay time must be between 0.1 and 20.0"),
            (self.decay_hf_ratio, 0.1, 2.0, "Decay HF ratio must be between 0.1 and 2.0"),
            (self.reflections_gain, 0.0, 3.16, "Reflections gain must be between 0.0 and 3.16"),
            (self.reflections_delay, 0.0, 0.3, "Reflections delay must be between 0.0 and 0.3"),
            (self.late_reverb_gain, 0.0, 10.0, "Late reverb gain must be between 0.0 and 10.0"),
            (self.late_reverb_delay, 0.0, 0.1, "Late reverb delay must be between 0.0 and 0.1"),
            (
                self.air_absorption_gain_hf,
                0.892,
                1.0,
                "Air absorption HF gain must be between 0.892 and 1.0",
            ),
        ];

        for (value, min, max, message) in checks {
            if !(min..=max).contains(&value) {
                return Err(message);
            }
        }
        Ok(())
    }
}

impl Default for ReverbPreset {
    fn default() -> Self {
        Self::GENERIC
    }
}

/// A reverb running in an auxiliary effect slot of the backend.
pub trait ReverbEffect: Send {
    /// Slot voices send into while reverb is enabled.
    fn slot(&self) -> EffectSlot;

    /// Load preset parameters into the effect. Returns `false` if the backend refuses them.
    fn apply_preset(&mut self, preset: &ReverbPreset) -> bool;

    /// Activate or bypass the effect slot.
    fn set_enabled(&mut self, enabled: bool) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_presets_validate() {
        for preset in [
            ReverbPreset::GENERIC,
            ReverbPreset::ROOM,
            ReverbPreset::CONCERT_HALL,
            ReverbPreset::CAVE,
            ReverbPreset::ARENA,
            ReverbPreset::UNDERWATER,
            ReverbPreset::FOREST,
        ] {
            assert!(preset.validate().is_ok(), "{:?}", preset);
        }
    }

    #[test]
    fn out_of_range_is_rejected() {
        let broken = ReverbPreset {
            decay_time: 45.0,
            ..ReverbPreset::GENERIC
        };
        assert!(broken.validate().is_err());

        let negative = ReverbPreset {
            gain: -0.1,
            ..ReverbPreset::ROOM
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(ReverbPreset::by_name("Cave"), Some(ReverbPreset::CAVE));
        assert_eq!(ReverbPreset::by_name("hall"), Some(ReverbPreset::CONCERT_HALL));
        assert_eq!(ReverbPreset::by_name("bathroom"), None);
    }
}
