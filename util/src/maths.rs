//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// Due to floating point round-off the result can equal `rhs.abs()` when
/// `lhs` is a tiny negative number.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    }
    else {
        r
    }
}

/// Wrap a value into the half-open range `(min, max]`.
///
/// Used for continuous inputs such as angles, where `min` and `max` describe
/// the same physical point.
pub fn input_modulus<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let range = max - min;
    let wrapped = max - rem_euclid(max - value, range);

    // The remainder can round to `range` for values a hair above `max`
    if wrapped <= min {
        wrapped + range
    }
    else {
        wrapped
    }
}

/// Wrap an angle in radians into the range `(-pi, pi]`.
pub fn wrap_angle<T>(angle_rad: T) -> T
where
    T: Float,
{
    let pi = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    input_modulus(angle_rad, -pi, pi)
}

/// Get the shortest signed angular distance travelling from `from` to `to`,
/// in radians.
///
/// The result lies in `(-pi, pi]` so that crossing the +/-pi boundary never
/// produces a jump of a full turn.
pub fn ang_dist<T>(from_rad: T, to_rad: T) -> T
where
    T: Float,
{
    wrap_angle(to_rad - from_rad)
}
