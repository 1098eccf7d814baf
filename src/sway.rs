//! Wind response. Everything here is a pure function of time and is applied
//! while drawing only; stored geometry never moves.

pub(crate) const AMPLITUDE: f32 = 10.0;
const BLOOM_TILT: f32 = 0.05;
const FLUTTER: f32 = 0.1;

/// Horizontal displacement of a point `fraction` of the way up a stem.
/// The base (fraction 0) stays planted.
pub(crate) fn lateral_offset(t: f32, sway_phase: f32, fraction: f32) -> f32 {
    (t + sway_phase + fraction * 2.0).sin() * (fraction * AMPLITUDE)
}

/// Horizontal displacement of the bloom centre (the stem tip).
pub(crate) fn bloom_offset(t: f32, sway_phase: f32) -> f32 {
    lateral_offset(t, sway_phase, 1.0)
}

pub(crate) fn bloom_rotation(t: f32, sway_phase: f32) -> f32 {
    (t + sway_phase).sin() * BLOOM_TILT
}

pub(crate) fn leaf_flutter(t: f32, leaf_phase: f32) -> f32 {
    (t * 2.0 + leaf_phase).sin() * FLUTTER
}
