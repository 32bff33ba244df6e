//! Small numeric helpers shared by the simulation modules.

/// Linear remap of `value` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// Deliberately unclamped: inputs outside the nominal range extrapolate
/// beyond the output range. The visual mappings rely on this, so do not add
/// clamping here.
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min)
}
