//! Unit and hydraulic math primitives.
//!
//! Pure functions with no state. Lengths passed as millimetres are converted
//! to metres internally; everything returned is in SI units (m, m², m³/s).
//! Malformed numeric input (NaN, infinity) is propagated, not rejected;
//! callers filter it out before reaching this module.

use std::f64::consts::PI;

/// Millimetres per metre.
pub const MM_PER_M: f64 = 1000.0;

/// Arithmetic mean of `values`, or 0 for an empty slice.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Area of a trapezoidal channel section in m².
pub fn trapezoidal_area(top_width: f64, bottom_width: f64, depth: f64) -> f64 {
    (top_width + bottom_width) / 2.0 * depth
}

/// Flow area divided by wetted perimeter.
///
/// A zero perimeter yields a radius of 0 rather than a division by zero.
pub fn hydraulic_radius(area: f64, wetted_perimeter: f64) -> f64 {
    if wetted_perimeter == 0.0 {
        return 0.0;
    }
    area / wetted_perimeter
}

/// Manning's equation: `Q = (1/n) * A * R^(2/3) * S^(1/2)`.
///
/// `slope` is a decimal fraction (0.02 for 2 %), not a percentage.
pub fn mannings_flow(n: f64, area: f64, hydraulic_radius: f64, slope: f64) -> f64 {
    (1.0 / n) * area * hydraulic_radius.powf(2.0 / 3.0) * slope.sqrt()
}

/// Full-bore area of a round pipe in m², from a diameter in mm.
pub fn pipe_area(diameter_mm: f64) -> f64 {
    let d = diameter_mm / MM_PER_M;
    PI * d * d / 4.0
}

/// Full-bore wetted perimeter of a round pipe in m, from a diameter in mm.
pub fn pipe_wetted_perimeter(diameter_mm: f64) -> f64 {
    PI * diameter_mm / MM_PER_M
}

/// Flow area of a rectangular box section in m², from span and rise in mm.
pub fn box_area(span_mm: f64, rise_mm: f64) -> f64 {
    (span_mm / MM_PER_M) * (rise_mm / MM_PER_M)
}

/// Full-flow wetted perimeter of a box section in m.
pub fn box_wetted_perimeter(span_mm: f64, rise_mm: f64) -> f64 {
    2.0 * (span_mm + rise_mm) / MM_PER_M
}

/// Width over depth, defined as 0 when `depth` is 0.
pub fn width_to_depth_ratio(width: f64, depth: f64) -> f64 {
    if depth == 0.0 {
        return 0.0;
    }
    width / depth
}

/// Round half away from zero to `decimals` places.
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Convert a percentage (2.0 for 2 %) into a decimal fraction.
pub fn percent_to_decimal(percent: f64) -> f64 {
    percent / 100.0
}

/// Convert hectares to square kilometres.
pub fn hectares_to_km2(hectares: f64) -> f64 {
    hectares / 100.0
}

/// Round `value_mm` up to the next multiple of `step_mm`.
pub fn round_up_to_step(value_mm: f64, step_mm: u32) -> u32 {
    if step_mm == 0 || value_mm <= 0.0 {
        return 0;
    }
    let step = step_mm as f64;
    ((value_mm / step).ceil() * step) as u32
}

#[cfg(test)]
pub(crate) fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
