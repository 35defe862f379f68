//! Heatmap aggregation
//!
//! Accumulates point contributions on a regular lng/lat grid with a Gaussian
//! kernel, and interpolates values at arbitrary locations by inverse distance
//! weighting.

use crate::geometry::{distance_between, Bounds, Coordinates, WeightedPoint};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default IDW distance exponent
pub const DEFAULT_IDW_POWER: f64 = 2.0;

/// Kernel bandwidth is the search radius divided by this
const SIGMA_DIVISOR: f64 = 3.0;

/// Accumulated density at a grid cell center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatCell {
    pub lng: f64,
    pub lat: f64,
    pub weight: f64,
}

/// Gaussian kernel density over a `grid_size × grid_size` grid spanning `bounds`
///
/// Cells are returned row by row starting at the minimum latitude, each row
/// running from the minimum longitude. Every point within `radius_km` of a
/// cell center adds `exp(-d² / 2σ²)` scaled by its weight (1 when unset),
/// with `σ = radius_km / 3`.
///
/// # Returns
/// An empty grid when `grid_size` is 0 or its square overflows; all-zero
/// weights when the radius is not positive
pub fn kernel_density_grid(
    points: &[WeightedPoint],
    bounds: &Bounds,
    grid_size: usize,
    radius_km: f64,
) -> Vec<HeatCell> {
    let Some(cell_count) = grid_size.checked_mul(grid_size).filter(|&c| c > 0) else {
        return Vec::new();
    };

    let lng_step = bounds.width() / grid_size as f64;
    let lat_step = bounds.height() / grid_size as f64;
    let sigma = radius_km / SIGMA_DIVISOR;

    let mut cells = Vec::with_capacity(cell_count);
    for row in 0..grid_size {
        let lat = bounds.min_lat + (row as f64 + 0.5) * lat_step;
        for col in 0..grid_size {
            let lng = bounds.min_lng + (col as f64 + 0.5) * lng_step;
            let center = Coordinates::new(lng, lat);

            let weight = if sigma > 0.0 {
                points
                    .iter()
                    .filter_map(|p| {
                        let d = distance_between(center, p.coords());
                        (d <= radius_km).then(|| {
                            (-(d * d) / (2.0 * sigma * sigma)).exp() * p.weight.unwrap_or(1.0)
                        })
                    })
                    .sum()
            } else {
                0.0
            };

            cells.push(HeatCell { lng, lat, weight });
        }
    }

    debug!(
        "Kernel density {}x{} grid, radius {}km, {} points",
        grid_size,
        grid_size,
        radius_km,
        points.len()
    );
    cells
}

/// Interpolate a value at `target` from known points
///
/// A known point at distance 0 returns its value directly. Otherwise each
/// value is weighted by `1 / d^power`.
///
/// # Returns
/// 0 for an empty set of known points
pub fn inverse_distance_weighting(known: &[WeightedPoint], target: Coordinates, power: f64) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;

    for point in known {
        let d = distance_between(target, point.coords());
        if d == 0.0 {
            return point.value;
        }
        let w = 1.0 / d.powf(power);
        weighted += w * point.value;
        total += w;
    }

    if total == 0.0 {
        0.0
    } else {
        weighted / total
    }
}
