//! Control vector synthesis

use crate::models::Direction;
use std::f64::consts::FRAC_PI_2;

/// Smallest magnitude of a shaped vector
pub const MIN_MAGNITUDE: f64 = 0.1;

/// Largest magnitude of a shaped vector
pub const MAX_MAGNITUDE: f64 = 1.0;

/// Gain applied to the squared relative deviation before the arctangent
const SLOPE_GAIN: f64 = 3.0;

/// Combine a direction with a magnitude shaped by the throughput deviation
///
/// Without a pivot reference (`pivot_average` is `None`) the raw direction is
/// returned unscaled.
pub fn synthesize(
    direction: Direction,
    throughput: f64,
    smoothed: f64,
    pivot_average: Option<f64>,
) -> f64 {
    match pivot_average {
        None => direction.signum(),
        Some(pivot) => direction.signum() * magnitude(throughput - smoothed, pivot),
    }
}

/// `clamp(atan(3a²) / (π/2), 0.1, 1.0)` with `a = deviation / pivot`
///
/// A non-positive pivot cannot scale the deviation: no deviation maps to the
/// floor, any deviation saturates.
pub fn magnitude(deviation: f64, pivot: f64) -> f64 {
    let relative = if pivot > f64::EPSILON {
        deviation / pivot
    } else if deviation.abs() <= f64::EPSILON {
        0.0
    } else {
        f64::INFINITY
    };

    if relative.is_nan() {
        return MIN_MAGNITUDE;
    }

    let slope = SLOPE_GAIN * relative * relative;
    (slope.atan() / FRAC_PI_2).clamp(MIN_MAGNITUDE, MAX_MAGNITUDE)
}
