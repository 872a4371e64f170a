//! Rotationally symmetric surface profiles.
//!
//! A profile describes the sag $z(x, y)$ of an optical surface measured from
//! its vertex plane. The outline helpers sample the meridional section
//! ($x = 0$) and return points as `[z, y]` pairs in the surface's local
//! coordinates, which is the form element outlines are assembled from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of samples per half-aperture when tracing an outline.
pub const DEFAULT_STEPS: usize = 6;

/// Errors evaluating a profile.
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("Sag undefined at height {height} for curvature {cv} (beyond the profile's hemisphere)")]
    SagOutOfRange { height: f64, cv: f64 },
}

/// The shape of an optical surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Profile {
    Spherical(Spherical),
    Conic(Conic),
}

/// A sphere (or plane when `cv == 0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spherical {
    /// Vertex curvature (1/radius).
    pub cv: f64,
}

/// A conic of revolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conic {
    /// Vertex curvature (1/radius).
    pub cv: f64,
    /// Conic constant: 0 sphere, -1 paraboloid, < -1 hyperboloid.
    pub cc: f64,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Spherical(Spherical { cv: 0.0 })
    }
}

impl Profile {
    /// A spherical profile with vertex curvature `cv`.
    pub fn spherical(cv: f64) -> Self {
        Profile::Spherical(Spherical { cv })
    }

    /// A conic profile; a zero conic constant collapses to a sphere.
    pub fn conic(cv: f64, cc: f64) -> Self {
        if cc == 0.0 {
            Profile::spherical(cv)
        } else {
            Profile::Conic(Conic { cv, cc })
        }
    }

    /// Vertex curvature.
    pub fn cv(&self) -> f64 {
        match self {
            Profile::Spherical(s) => s.cv,
            Profile::Conic(c) => c.cv,
        }
    }

    /// Replace the vertex curvature, keeping the conic constant.
    pub fn set_cv(&mut self, cv: f64) {
        match self {
            Profile::Spherical(s) => s.cv = cv,
            Profile::Conic(c) => c.cv = cv,
        }
    }

    fn conic_constant(&self) -> f64 {
        match self {
            Profile::Spherical(_) => 0.0,
            Profile::Conic(c) => c.cc,
        }
    }

    /// Sag of the surface at transverse position `(x, y)`.
    ///
    /// $z = \frac{c r^2}{1 + \sqrt{1 - (1 + k) c^2 r^2}}$
    pub fn sag(&self, x: f64, y: f64) -> Result<f64, ProfileError> {
        let cv = self.cv();
        let r_sqr = x * x + y * y;
        let arg = 1.0 - (1.0 + self.conic_constant()) * cv * cv * r_sqr;
        if arg < 0.0 {
            return Err(ProfileError::SagOutOfRange {
                height: r_sqr.sqrt(),
                cv,
            });
        }
        Ok(cv * r_sqr / (1.0 + arg.sqrt()))
    }

    /// Sample the meridional section between `lower` and `upper` heights.
    ///
    /// Heights where the sag is undefined are dropped. When `dir` is
    /// negative the points run from `upper` down to `lower`.
    pub fn profile(&self, lower: f64, upper: f64, dir: f64, steps: usize) -> Vec<[f64; 2]> {
        let intervals = (2 * steps).max(1);
        let delta = (upper - lower) / intervals as f64;
        let mut points: Vec<[f64; 2]> = (0..=intervals)
            .map(|i| lower + delta * i as f64)
            .filter_map(|y| self.sag(0.0, y).ok().map(|z| [z, y]))
            .collect();
        if dir < 0.0 {
            points.reverse();
        }
        points
    }

    /// Outline of the surface over `extent`, optionally with an edge flat.
    ///
    /// With a flat at height `flat`, the curved part only spans
    /// `[-flat, flat]` and is closed by two points at the flat's sag that
    /// reach out to the edge extent.
    pub fn full_profile(&self, extent: (f64, f64), flat: Option<f64>, dir: f64) -> Vec<[f64; 2]> {
        let Some(flat) = flat else {
            return self.profile(extent.0, extent.1, dir, DEFAULT_STEPS);
        };

        let (mut sd_lwr, mut sd_upr) = extent;
        if dir < 0.0 {
            std::mem::swap(&mut sd_lwr, &mut sd_upr);
        }
        let flat_sag = self.sag(0.0, flat).ok();

        let mut prf = Vec::new();
        if let Some(z) = flat_sag {
            prf.push([z, sd_lwr]);
        }
        prf.extend(self.profile(-flat, flat, dir, DEFAULT_STEPS));
        if let Some(z) = flat_sag {
            prf.push([z, sd_upr]);
        }
        prf
    }
}
