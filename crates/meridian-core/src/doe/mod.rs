//! Diffractive and holographic phase transfer.
//!
//! When a ray crosses a surface carrying a grating or a hologram, its
//! direction changes by the local gradient of the recorded phase. Both
//! strategies solve the same local eikonal equation for the multiple $Q$ of
//! the surface normal that keeps the outgoing direction on the unit sphere:
//!
//! $$Q = -b + \sqrt{b^2 - 2c}$$
//!
//! with $b$ and $c$ supplied by the strategy. The surface normal is
//! normalised and oriented along the incoming ray before use, so the root
//! taken is always the one that continues forward through the surface.
//!
//! - [`grating::DiffractiveElement`] — radially symmetric polynomial phase.
//! - [`hologram::HolographicElement`] — two-point-source hologram.

pub mod grating;
pub mod hologram;

pub use grating::{radial_phase_fct, DiffractiveElement};
pub use hologram::HolographicElement;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of a single ray at a diffractive surface.
#[derive(Debug, Error, PartialEq)]
pub enum DiffractionError {
    #[error("No real diffracted ray: eikonal discriminant {discriminant:.3e} is negative")]
    NoRealSolution { discriminant: f64 },

    #[error("Surface normal has zero length")]
    DegenerateNormal,

    #[error("Surface point coincides with a hologram construction point")]
    DegenerateConstructionPoint,

    #[error("Trace wavelength must be positive, got {0}")]
    InvalidWavelength(f64),
}

/// Outgoing direction and accumulated phase of a diffracted ray.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseResult {
    /// Outgoing ray direction.
    pub out_dir: Vector3<f64>,
    /// Phase added at the surface (reference-wavelength units).
    pub phase: f64,
}

/// A surface that redirects rays by a recorded phase.
pub trait PhaseElement {
    /// Human-readable label.
    fn label(&self) -> &str;

    /// Wavelength (nm) at which the phase was recorded.
    fn reference_wavelength(&self) -> f64;

    /// Redirect a ray crossing the surface at `pt`.
    ///
    /// # Arguments
    /// * `pt` - Intersection point in the surface's local frame.
    /// * `in_dir` - Incoming unit direction.
    /// * `srf_nrml` - Surface normal at `pt`; need not be normalised.
    /// * `wl` - Trace wavelength (nm); `None` traces at the reference
    ///   wavelength.
    fn phase(
        &self,
        pt: &Vector3<f64>,
        in_dir: &Vector3<f64>,
        srf_nrml: &Vector3<f64>,
        wl: Option<f64>,
    ) -> Result<PhaseResult, DiffractionError>;
}

/// The phase-transfer strategies an interface can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PhaseTransfer {
    Grating(DiffractiveElement),
    Hologram(HolographicElement),
}

impl PhaseElement for PhaseTransfer {
    fn label(&self) -> &str {
        match self {
            PhaseTransfer::Grating(g) => g.label(),
            PhaseTransfer::Hologram(h) => h.label(),
        }
    }

    fn reference_wavelength(&self) -> f64 {
        match self {
            PhaseTransfer::Grating(g) => g.reference_wavelength(),
            PhaseTransfer::Hologram(h) => h.reference_wavelength(),
        }
    }

    fn phase(
        &self,
        pt: &Vector3<f64>,
        in_dir: &Vector3<f64>,
        srf_nrml: &Vector3<f64>,
        wl: Option<f64>,
    ) -> Result<PhaseResult, DiffractionError> {
        match self {
            PhaseTransfer::Grating(g) => g.phase(pt, in_dir, srf_nrml, wl),
            PhaseTransfer::Hologram(h) => h.phase(pt, in_dir, srf_nrml, wl),
        }
    }
}

/// Wavelength scale factor $\mu = \lambda / \lambda_{\text{ref}}$.
pub(crate) fn wavelength_scale(wl: Option<f64>, ref_wl: f64) -> Result<f64, DiffractionError> {
    match wl {
        None => Ok(1.0),
        Some(w) if w > 0.0 && w.is_finite() => Ok(w / ref_wl),
        Some(w) => Err(DiffractionError::InvalidWavelength(w)),
    }
}

/// Unit surface normal pointing along the incoming ray.
pub(crate) fn oriented_normal(
    srf_nrml: &Vector3<f64>,
    in_dir: &Vector3<f64>,
) -> Result<Vector3<f64>, DiffractionError> {
    let normal = srf_nrml
        .try_normalize(f64::EPSILON)
        .ok_or(DiffractionError::DegenerateNormal)?;
    if in_dir.dot(&normal) < 0.0 {
        Ok(-normal)
    } else {
        Ok(normal)
    }
}

/// Forward root of $Q^2 + 2bQ + 2c = 0$.
pub(crate) fn solve_eikonal(b: f64, c: f64) -> Result<f64, DiffractionError> {
    let discriminant = b * b - 2.0 * c;
    if discriminant < 0.0 {
        return Err(DiffractionError::NoRealSolution { discriminant });
    }
    Ok(-b + discriminant.sqrt())
}
