//! The medium trait and the built-in media.
//!
//! Glass codes follow the catalogue convention `nnn.vvv`: the integer part
//! is $1000 (n_d - 1)$ and the fraction is $V_d / 100$, so N-BK7
//! ($n_d = 1.5168$, $V_d = 64.17$) encodes as `517.642`.

use std::sync::Arc;

use thiserror::Error;

/// Fraunhofer d line (He, 587.56 nm).
pub const LAMBDA_D: f64 = 587.5618;
/// Fraunhofer F line (H, 486.13 nm).
pub const LAMBDA_F: f64 = 486.1327;
/// Fraunhofer C line (H, 656.27 nm).
pub const LAMBDA_C: f64 = 656.2725;

/// Errors from media.
#[derive(Debug, Error, PartialEq)]
pub enum MediumError {
    #[error("Wavelength must be positive, got {0} nm")]
    InvalidWavelength(f64),

    #[error("Invalid glass code: {0}")]
    InvalidGlassCode(f64),
}

/// An optical medium filling a gap.
pub trait Medium: Send + Sync + std::fmt::Debug {
    /// Catalogue name, e.g. `"air"` or `"N-BK7"`.
    fn name(&self) -> &str;

    /// Six-digit glass code, if the medium has dispersion data.
    fn glass_code(&self) -> Option<f64> {
        None
    }

    /// Refractive index at a wavelength in nanometres.
    fn refractive_index(&self, wavelength_nm: f64) -> Result<f64, MediumError>;
}

/// Air, treated as a vacuum (n = 1 at all wavelengths).
#[derive(Debug, Clone, Default)]
pub struct Air;

impl Medium for Air {
    fn name(&self) -> &str {
        "air"
    }

    fn refractive_index(&self, wavelength_nm: f64) -> Result<f64, MediumError> {
        check_wavelength(wavelength_nm)?;
        Ok(1.0)
    }
}

/// A shared instance of [`Air`].
pub fn air() -> Arc<dyn Medium> {
    Arc::new(Air)
}

/// A glass described by its d-line index and Abbe number.
///
/// The dispersion is a two-term Cauchy law $n(\lambda) = A + B/\lambda^2$
/// passing through $n_d$ with $n_F - n_C = (n_d - 1)/V_d$.
#[derive(Debug, Clone)]
pub struct ModelGlass {
    name: String,
    nd: f64,
    vd: f64,
}

impl ModelGlass {
    pub fn new(name: impl Into<String>, nd: f64, vd: f64) -> Self {
        Self {
            name: name.into(),
            nd,
            vd,
        }
    }

    pub fn nd(&self) -> f64 {
        self.nd
    }

    pub fn vd(&self) -> f64 {
        self.vd
    }

    /// Cauchy coefficients (A, B), with B in nm².
    fn cauchy(&self) -> (f64, f64) {
        if self.vd <= 0.0 {
            return (self.nd, 0.0);
        }
        let dn = (self.nd - 1.0) / self.vd;
        let b = dn / (1.0 / (LAMBDA_F * LAMBDA_F) - 1.0 / (LAMBDA_C * LAMBDA_C));
        let a = self.nd - b / (LAMBDA_D * LAMBDA_D);
        (a, b)
    }
}

impl Medium for ModelGlass {
    fn name(&self) -> &str {
        &self.name
    }

    fn glass_code(&self) -> Option<f64> {
        Some(glass_encode(self.nd, self.vd))
    }

    fn refractive_index(&self, wavelength_nm: f64) -> Result<f64, MediumError> {
        check_wavelength(wavelength_nm)?;
        let (a, b) = self.cauchy();
        Ok(a + b / (wavelength_nm * wavelength_nm))
    }
}

fn check_wavelength(wavelength_nm: f64) -> Result<(), MediumError> {
    if wavelength_nm > 0.0 && wavelength_nm.is_finite() {
        Ok(())
    } else {
        Err(MediumError::InvalidWavelength(wavelength_nm))
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Encode a d-line index and Abbe number as a glass code.
pub fn glass_encode(n: f64, v: f64) -> f64 {
    1000.0 * round_to(n - 1.0, 3) + round_to(v / 100.0, 3)
}

/// Decode a glass code into `(n_d, V_d)`.
pub fn glass_decode(code: f64) -> Result<(f64, f64), MediumError> {
    if !code.is_finite() || code <= 0.0 {
        return Err(MediumError::InvalidGlassCode(code));
    }
    let whole = code.trunc();
    let index = round_to(1.0 + whole / 1000.0, 4);
    let vnbr = round_to(100.0 * (code - whole), 4);
    Ok((index, vnbr))
}

fn normalised_name(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

/// Whether a medium is air, by case- and whitespace-insensitive name.
pub fn is_air(medium: &dyn Medium) -> bool {
    normalised_name(medium.name()) == "air"
}

/// Whether two gap media are the same material.
///
/// Media match when they are the same shared object, or when their names
/// agree ignoring case and whitespace.
pub fn same_medium(a: &Arc<dyn Medium>, b: &Arc<dyn Medium>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    ) || normalised_name(a.name()) == normalised_name(b.name())
}
