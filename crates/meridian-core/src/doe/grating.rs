//! Diffractive surfaces with a radially symmetric polynomial phase.
//!
//! The recorded phase is
//!
//! $$W(r^2) = \sum_k c_k \, r^{2(k+1)}$$
//!
//! and its transverse slopes are the analytic derivatives of the same sum,
//! $\partial W / \partial x = \sum_k 2(k+1) c_k \, x \, r^{2k}$ (and likewise
//! in $y$).

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::{
    oriented_normal, solve_eikonal, wavelength_scale, DiffractionError, PhaseElement, PhaseResult,
};

/// Phase $W$ and slopes $(\partial W/\partial x, \partial W/\partial y)$ at `pt`.
pub fn radial_phase_fct(pt: &Vector3<f64>, coefficients: &[f64]) -> (f64, f64, f64) {
    let (x, y) = (pt.x, pt.y);
    let r_sqr = x * x + y * y;

    let mut w = 0.0;
    let mut dw_dr_sqr = 0.0;
    // r^(2k)
    let mut r_exp = 1.0;
    for (k, c) in coefficients.iter().enumerate() {
        let order = (k + 1) as f64;
        dw_dr_sqr += order * c * r_exp;
        r_exp *= r_sqr;
        w += c * r_exp;
    }
    // d/dx f(r^2) = 2x f'(r^2)
    (w, 2.0 * x * dw_dr_sqr, 2.0 * y * dw_dr_sqr)
}

fn default_ref_wl() -> f64 {
    550.0
}

fn default_order() -> i32 {
    1
}

/// A diffractive optical element (kinoform or grating).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffractiveElement {
    #[serde(default)]
    pub label: String,
    /// Polynomial coefficients $c_k$ of the radial phase.
    #[serde(default)]
    pub coefficients: Vec<f64>,
    /// Design wavelength (nm).
    #[serde(default = "default_ref_wl")]
    pub ref_wl: f64,
    /// Diffraction order; scales the recorded phase.
    #[serde(default = "default_order")]
    pub order: i32,
}

impl Default for DiffractiveElement {
    fn default() -> Self {
        Self {
            label: String::new(),
            coefficients: Vec::new(),
            ref_wl: default_ref_wl(),
            order: default_order(),
        }
    }
}

impl DiffractiveElement {
    pub fn new(coefficients: Vec<f64>, ref_wl: f64) -> Self {
        Self {
            coefficients,
            ref_wl,
            ..Default::default()
        }
    }

    /// One-line description of the element.
    pub fn list_doe(&self) -> String {
        format!(
            "DOE {:?}: order {}, ref_wl {:.3} nm, coefficients {:?}",
            self.label, self.order, self.ref_wl, self.coefficients
        )
    }
}

impl PhaseElement for DiffractiveElement {
    fn label(&self) -> &str {
        &self.label
    }

    fn reference_wavelength(&self) -> f64 {
        self.ref_wl
    }

    fn phase(
        &self,
        pt: &Vector3<f64>,
        in_dir: &Vector3<f64>,
        srf_nrml: &Vector3<f64>,
        wl: Option<f64>,
    ) -> Result<PhaseResult, DiffractionError> {
        let normal = oriented_normal(srf_nrml, in_dir)?;
        let mu = wavelength_scale(wl, self.ref_wl)?;

        let (w, w_x, w_y) = radial_phase_fct(pt, &self.coefficients);
        let m = self.order as f64;
        let (w, w_x, w_y) = (m * w, m * w_x, m * w_y);

        let in_cos_i = in_dir.dot(&normal);
        let b = in_cos_i + mu * (normal.x * w_x + normal.y * w_y);
        let c = mu * (mu * (w_x * w_x - w_y * w_y) / 2.0 + (in_dir.x * w_x - in_dir.y * w_y));
        let q = solve_eikonal(b, c)?;

        let out_dir = in_dir + mu * Vector3::new(w_x, w_y, 0.0) + q * normal;
        Ok(PhaseResult { out_dir, phase: w })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_radial_phase_single_term() {
        // W = c r^2 -> dW/dx = 2 c x
        let (w, wx, wy) = radial_phase_fct(&Vector3::new(3.0, 4.0, 0.0), &[0.5]);
        assert_abs_diff_eq!(w, 12.5, epsilon = 1e-12);
        assert_abs_diff_eq!(wx, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wy, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_radial_phase_slopes_match_finite_differences() {
        let coeffs = [1.0e-3, -2.0e-5, 3.0e-7];
        let p = Vector3::new(1.3, -0.7, 0.0);
        let h = 1e-6;
        let (_, wx, wy) = radial_phase_fct(&p, &coeffs);
        let w_at = |x: f64, y: f64| radial_phase_fct(&Vector3::new(x, y, 0.0), &coeffs).0;
        let fd_x = (w_at(p.x + h, p.y) - w_at(p.x - h, p.y)) / (2.0 * h);
        let fd_y = (w_at(p.x, p.y + h) - w_at(p.x, p.y - h)) / (2.0 * h);
        assert_abs_diff_eq!(wx, fd_x, epsilon = 1e-9);
        assert_abs_diff_eq!(wy, fd_y, epsilon = 1e-9);
    }

    #[test]
    fn test_order_scales_phase() {
        let mut doe = DiffractiveElement::new(vec![0.01], 550.0);
        let pt = Vector3::new(1.0, 0.0, 0.0);
        let dir = Vector3::new(0.0, 0.0, 1.0);
        let first = doe.phase(&pt, &dir, &dir, None).unwrap();
        doe.order = 2;
        let second = doe.phase(&pt, &dir, &dir, None).unwrap();
        assert_abs_diff_eq!(second.phase, 2.0 * first.phase, epsilon = 1e-15);
        assert!(second.out_dir.x > first.out_dir.x);
    }

    #[test]
    fn test_list_doe_mentions_order() {
        let doe = DiffractiveElement::default();
        assert!(doe.list_doe().contains("order 1"));
    }
}
