//! Small trigonometric helpers shared by the validator and the synthesizer.
//!
//! Angles are included angles in degrees, as quoted for drill points,
//! V-bits and countersinks.

use std::f64::consts::PI;

/// Whether an included angle describes a flat-bottomed tool or recess.
pub fn is_flat(included_deg: f64) -> bool {
    included_deg <= 0.0 || included_deg >= 180.0
}

/// Half of an included angle, in radians.
pub fn half_angle(included_deg: f64) -> f64 {
    (included_deg / 2.0).to_radians()
}

/// Depth of a cone with the given included angle that widens by `radial`.
///
/// Flat angles have no cone and return 0.
pub fn cone_depth(radial: f64, included_deg: f64) -> f64 {
    if is_flat(included_deg) {
        0.0
    } else {
        radial / half_angle(included_deg).tan()
    }
}

/// Radial widening of a cone with the given included angle over `depth`.
///
/// Flat angles return 0.
pub fn cone_run(depth: f64, included_deg: f64) -> f64 {
    if is_flat(included_deg) {
        0.0
    } else {
        depth * half_angle(included_deg).tan()
    }
}

/// Radius scale that keeps an `facets`-gon from being undersized.
///
/// A regular n-gon inscribed in a circle of radius `r / cos(pi / n)` has
/// an apothem of exactly `r`.
pub fn compensation_factor(facets: u32) -> f64 {
    1.0 / (PI / facets as f64).cos()
}

/// Narrowest width of a regular n-gon with the given circumradius.
pub fn polygon_min_width(circumradius: f64, facets: u32) -> f64 {
    let c = (PI / facets as f64).cos();
    if facets % 2 == 0 {
        2.0 * circumradius * c
    } else {
        circumradius * (1.0 + c)
    }
}
