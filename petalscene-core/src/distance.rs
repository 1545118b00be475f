//! Distance attenuation.
//!
//! Maps the listener-to-source distance onto a gain multiplier in `[0, 1]` using the
//! classic OpenAL family of models. Malformed distance parameters never produce
//! audibility: a non-positive reference distance, or a maximum distance that does not
//! exceed the reference, yields exactly zero.

use crate::math::Vec3;

/// Distance attenuation model applied to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistanceModel {
    /// `ref / (ref + rolloff * (d - ref))`
    InverseDistance,
    /// Inverse distance with `d` clamped to `[ref, max]`
    #[default]
    InverseDistanceClamped,
    /// `1 - rolloff * (d - ref) / (max - ref)`, with `d` capped at `max`
    LinearDistance,
    /// Linear distance with `d` clamped to `[ref, max]`
    LinearDistanceClamped,
    /// `(d / ref) ^ -rolloff`
    ExponentDistance,
    /// Exponent distance with `d` clamped to `[ref, max]`
    ExponentDistanceClamped,
}

impl DistanceModel {
    /// Attenuation factor for `distance`, always within `[0, 1]`.
    ///
    /// Callers are expected to have validated `ref_distance > 0` and
    /// `max_distance > ref_distance`; see [`compute_gain`].
    pub fn attenuate(
        &self,
        distance: f32,
        ref_distance: f32,
        max_distance: f32,
        rolloff: f32,
    ) -> f32 {
        let clamped = distance.clamp(ref_distance, max_distance);
        let gain = match self {
            Self::InverseDistance => inverse(distance, ref_distance, rolloff),
            Self::InverseDistanceClamped => {
                if distance <= ref_distance {
                    1.0
                } else {
                    inverse(clamped, ref_distance, rolloff)
                }
            }
            Self::LinearDistance => linear(
                distance.min(max_distance),
                ref_distance,
                max_distance,
                rolloff,
            ),
            Self::LinearDistanceClamped => linear(clamped, ref_distance, max_distance, rolloff),
            Self::ExponentDistance => exponent(distance, ref_distance, rolloff),
            Self::ExponentDistanceClamped => exponent(clamped, ref_distance, rolloff),
        };
        unit_range(gain)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InverseDistance => "InverseDistance",
            Self::InverseDistanceClamped => "InverseDistanceClamped",
            Self::LinearDistance => "LinearDistance",
            Self::LinearDistanceClamped => "LinearDistanceClamped",
            Self::ExponentDistance => "ExponentDistance",
            Self::ExponentDistanceClamped => "ExponentDistanceClamped",
        }
    }
}

/// Parameters that decide how a source fades with distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub model: DistanceModel,
    pub rolloff_factor: f32,
    pub ref_distance: f32,
    pub max_distance: f32,
}

impl Attenuation {
    /// True when the distance range can produce audibility at all.
    pub fn is_valid(&self) -> bool {
        self.ref_distance > 0.0 && self.max_distance > self.ref_distance
    }
}

/// Distance attenuation of a source at `source_position` heard from `listener_position`.
///
/// Returns 0 when `source_gain <= 0` or the distance range is malformed, otherwise the
/// model's attenuation in `[0, 1]`. The effective gain used for admission and scheduling
/// is this value multiplied by `source_gain`.
pub fn compute_gain(
    listener_position: Vec3,
    source_position: Vec3,
    source_gain: f32,
    attenuation: &Attenuation,
) -> f32 {
    if source_gain <= 0.0 || !attenuation.is_valid() {
        return 0.0;
    }

    let distance = listener_position.distance(source_position);
    attenuation.model.attenuate(
        distance,
        attenuation.ref_distance,
        attenuation.max_distance,
        attenuation.rolloff_factor,
    )
}

fn inverse(distance: f32, ref_distance: f32, rolloff: f32) -> f32 {
    let denominator = ref_distance + rolloff * (distance - ref_distance);
    if denominator <= 0.0 {
        return 1.0;
    }
    ref_distance / denominator
}

fn linear(distance: f32, ref_distance: f32, max_distance: f32, rolloff: f32) -> f32 {
    1.0 - rolloff * (distance - ref_distance) / (max_distance - ref_distance)
}

fn exponent(distance: f32, ref_distance: f32, rolloff: f32) -> f32 {
    (distance / ref_distance).powf(-rolloff)
}

fn unit_range(gain: f32) -> f32 {
    if gain.is_nan() { 0.0 } else { gain.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL_MODELS: [DistanceModel; 6] = [
        DistanceModel::InverseDistance,
        DistanceModel::InverseDistanceClamped,
        DistanceModel::LinearDistance,
        DistanceModel::LinearDistanceClamped,
        DistanceModel::ExponentDistance,
        DistanceModel::ExponentDistanceClamped,
    ];

    fn params(model: DistanceModel) -> Attenuation {
        Attenuation {
            model,
            rolloff_factor: 1.0,
            ref_distance: 1.0,
            max_distance: 10.0,
        }
    }

    fn gain_at(model: DistanceModel, distance: f32) -> f32 {
        compute_gain(
            Vec3::ZERO,
            Vec3::new(distance, 0.0, 0.0),
            1.0,
            &params(model),
        )
    }

    #[test]
    fn inverse_clamped_at_five_units() {
        assert_abs_diff_eq!(
            gain_at(DistanceModel::InverseDistanceClamped, 5.0),
            0.2,
            epsilon = 1e-6
        );
    }

    #[test]
    fn linear_clamped_at_five_units() {
        assert_abs_diff_eq!(
            gain_at(DistanceModel::LinearDistanceClamped, 5.0),
            0.5556,
            epsilon = 1e-3
        );
    }

    #[test]
    fn linear_reaches_silence_at_max() {
        assert_eq!(gain_at(DistanceModel::LinearDistance, 10.0), 0.0);
        assert_eq!(gain_at(DistanceModel::LinearDistance, 50.0), 0.0);
    }

    #[test]
    fn exponent_halves_at_double_reference() {
        assert_abs_diff_eq!(
            gain_at(DistanceModel::ExponentDistance, 2.0),
            0.5,
            epsilon = 1e-6
        );
    }

    #[test]
    fn clamped_models_hold_full_gain_inside_reference() {
        for model in [
            DistanceModel::InverseDistanceClamped,
            DistanceModel::LinearDistanceClamped,
            DistanceModel::ExponentDistanceClamped,
        ] {
            assert_eq!(gain_at(model, 0.25), 1.0, "{}", model.name());
        }
    }

    #[test]
    fn clamped_models_stop_falling_beyond_max() {
        let at_max = gain_at(DistanceModel::InverseDistanceClamped, 10.0);
        let beyond = gain_at(DistanceModel::InverseDistanceClamped, 1000.0);
        assert_eq!(at_max, beyond);
    }

    #[test]
    fn every_model_stays_in_unit_range() {
        let distances = [0.0, 0.001, 0.5, 1.0, 2.5, 9.99, 10.0, 37.0, 1.0e6];
        let rolloffs = [0.0, 0.3, 1.0, 4.0];
        for model in ALL_MODELS {
            for rolloff in rolloffs {
                for distance in distances {
                    let attenuation = Attenuation {
                        rolloff_factor: rolloff,
                        ..params(model)
                    };
                    let gain = compute_gain(
                        Vec3::ZERO,
                        Vec3::new(0.0, distance, 0.0),
                        1.0,
                        &attenuation,
                    );
                    assert!(
                        (0.0..=1.0).contains(&gain),
                        "{} rolloff {} distance {} -> {}",
                        model.name(),
                        rolloff,
                        distance,
                        gain
                    );
                }
            }
        }
    }

    #[test]
    fn malformed_ranges_are_silent() {
        for model in ALL_MODELS {
            let zero_ref = Attenuation {
                ref_distance: 0.0,
                ..params(model)
            };
            let inverted = Attenuation {
                ref_distance: 5.0,
                max_distance: 5.0,
                ..params(model)
            };
            let at_listener = Vec3::ZERO;
            assert_eq!(compute_gain(Vec3::ZERO, at_listener, 1.0, &zero_ref), 0.0);
            assert_eq!(compute_gain(Vec3::ZERO, at_listener, 1.0, &inverted), 0.0);
        }
    }

    #[test]
    fn muted_source_is_silent() {
        let attenuation = params(DistanceModel::InverseDistance);
        assert_eq!(compute_gain(Vec3::ZERO, Vec3::ZERO, 0.0, &attenuation), 0.0);
        assert_eq!(compute_gain(Vec3::ZERO, Vec3::ZERO, -0.5, &attenuation), 0.0);
    }
}
