//! Piecewise-linear interpolation with flat extrapolation.

use crate::error::{MapError, Result};

/// Linear blend between `(x0, y0)` and `(x1, y1)` at `x`
#[inline]
pub fn lerp(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    let t = (x - x0) / (x1 - x0);
    y0 + t * (y1 - y0)
}

/// Evaluate a curve given as `(x, y)` points sorted by strictly increasing `x`.
///
/// Queries before the first point return the first value and queries after the
/// last point return the last value. A single point is a constant curve.
pub fn piecewise(points: &[(f64, f64)], x: f64) -> Result<f64> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(MapError::Configuration(
                "cannot interpolate a curve with no active points".to_string(),
            ))
        }
    };

    if x.is_nan() {
        return Err(MapError::Range("interpolation query is NaN".to_string()));
    }
    if x <= first.0 {
        return Ok(first.1);
    }
    if x >= last.0 {
        return Ok(last.1);
    }

    // First point strictly greater than x; x > first.0 so idx >= 1
    let idx = points.partition_point(|&(px, _)| px <= x);
    let (x0, y0) = points[idx - 1];
    let (x1, y1) = points[idx];
    Ok(lerp(x0, y0, x1, y1, x))
}
