//! Transverse Mercator projection
//!
//! Forward and inverse series from Snyder, "Map Projections: A Working
//! Manual" (USGS PP 1395), §8. Accurate to well under a meter within a few
//! degrees of the central meridian, which covers the whole regional grid.

use crate::constants::projection::*;
use serde::{Deserialize, Serialize};

/// Ellipsoid and grid parameters of a transverse Mercator projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// Semi-major axis in meters
    pub semi_major_axis: f64,
    /// Inverse flattening (1/f)
    pub inverse_flattening: f64,
    /// Scale factor on the central meridian
    pub scale_factor: f64,
    /// Central meridian in degrees
    pub central_meridian: f64,
    /// False easting in meters
    pub false_easting: f64,
    /// False northing in meters
    pub false_northing: f64,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            semi_major_axis: SEMI_MAJOR_AXIS,
            inverse_flattening: INVERSE_FLATTENING,
            scale_factor: SCALE_FACTOR,
            central_meridian: CENTRAL_MERIDIAN,
            false_easting: FALSE_EASTING,
            false_northing: FALSE_NORTHING,
        }
    }
}

/// A transverse Mercator projection with its derived ellipsoid constants
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    params: ProjectionParams,
    /// First eccentricity squared
    e2: f64,
    /// Second eccentricity squared
    ep2: f64,
    /// Meridian arc series coefficients
    m: [f64; 4],
    /// Footpoint latitude series coefficients
    fp: [f64; 4],
}

impl TransverseMercator {
    /// Create a projection from its parameters
    pub fn new(params: ProjectionParams) -> Self {
        let f = 1.0 / params.inverse_flattening;
        let e2 = f * (2.0 - f);
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let m = [
            1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0,
            3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0,
            15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0,
            35.0 * e6 / 3072.0,
        ];

        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
        let fp = [
            3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0,
            21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0,
            151.0 * e1.powi(3) / 96.0,
            1097.0 * e1.powi(4) / 512.0,
        ];

        Self {
            params,
            e2,
            ep2,
            m,
            fp,
        }
    }

    /// Projection parameters
    pub fn params(&self) -> &ProjectionParams {
        &self.params
    }

    /// Meridian arc length from the equator to latitude `phi` (radians)
    fn meridian_arc(&self, phi: f64) -> f64 {
        self.params.semi_major_axis
            * (self.m[0] * phi - self.m[1] * (2.0 * phi).sin() + self.m[2] * (4.0 * phi).sin()
                - self.m[3] * (6.0 * phi).sin())
    }

    /// Project (lng, lat) in degrees to (x, y) in meters
    pub fn forward(&self, lng: f64, lat: f64) -> (f64, f64) {
        let p = &self.params;
        let phi = lat.to_radians();
        let lambda = (lng - p.central_meridian).to_radians();

        let sin_phi = phi.sin();
        let cos_phi = phi.cos();
        let tan_phi = phi.tan();

        let n = p.semi_major_axis / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = self.ep2 * cos_phi * cos_phi;
        let a = lambda * cos_phi;

        let x = p.false_easting
            + p.scale_factor
                * n
                * (a + (1.0 - t + c) * a.powi(3) / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a.powi(5) / 120.0);

        let y = p.false_northing
            + p.scale_factor
                * (self.meridian_arc(phi)
                    + n * tan_phi
                        * (a * a / 2.0
                            + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                            + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2)
                                * a.powi(6)
                                / 720.0));

        (x, y)
    }

    /// Unproject (x, y) in meters to (lng, lat) in degrees
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let p = &self.params;

        // Footpoint latitude
        let arc = (y - p.false_northing) / p.scale_factor;
        let mu = arc / (p.semi_major_axis * self.m[0]);
        let phi1 = mu
            + self.fp[0] * (2.0 * mu).sin()
            + self.fp[1] * (4.0 * mu).sin()
            + self.fp[2] * (6.0 * mu).sin()
            + self.fp[3] * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();
        let w = 1.0 - self.e2 * sin_phi1 * sin_phi1;

        let c1 = self.ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let n1 = p.semi_major_axis / w.sqrt();
        let r1 = p.semi_major_axis * (1.0 - self.e2) / w.powf(1.5);
        let d = (x - p.false_easting) / (n1 * p.scale_factor);

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * self.ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * self.ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let lambda = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * self.ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_phi1;

        (p.central_meridian + lambda.to_degrees(), phi.to_degrees())
    }
}

impl Default for TransverseMercator {
    fn default() -> Self {
        Self::new(ProjectionParams::default())
    }
}
