//! Linear range mapping between pixel space and actuator angles.

/// Map `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// Output bounds may be inverted (`out_min > out_max`) to mirror the
/// camera: a larger pixel x maps to a smaller pan angle. The result is not
/// clamped; actuators clamp on write.
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}
