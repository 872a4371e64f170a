//! Two-point-source holographic optical elements.
//!
//! A hologram is recorded by interfering a reference beam and an object
//! beam, each diverging from (or, when virtual, converging to) a
//! construction point. A replay ray arriving along the reference beam
//! leaves along the object beam; other rays are redirected by the
//! difference of the two construction directions.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::{
    oriented_normal, solve_eikonal, wavelength_scale, DiffractionError, PhaseElement, PhaseResult,
};

/// Default construction point: on axis, effectively at infinity.
const FAR_AXIAL_POINT: [f64; 3] = [0.0, 0.0, -1.0e10];

/// A holographic optical element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolographicElement {
    #[serde(default)]
    pub label: String,
    /// Reference beam construction point.
    pub ref_pt: [f64; 3],
    /// The reference beam converges on `ref_pt` instead of diverging from it.
    #[serde(default)]
    pub ref_virtual: bool,
    /// Object beam construction point.
    pub obj_pt: [f64; 3],
    #[serde(default)]
    pub obj_virtual: bool,
    /// Construction wavelength (nm).
    pub ref_wl: f64,
}

impl Default for HolographicElement {
    fn default() -> Self {
        Self {
            label: String::new(),
            ref_pt: FAR_AXIAL_POINT,
            ref_virtual: false,
            obj_pt: FAR_AXIAL_POINT,
            obj_virtual: false,
            ref_wl: 550.0,
        }
    }
}

impl HolographicElement {
    /// Two-line description of the construction points.
    pub fn list_hoe(&self) -> String {
        let fmt_pt = |p: &[f64; 3], virt: bool| {
            format!("{:12.5} {:12.5} {:12.5} {}", p[0], p[1], p[2], virt)
        };
        format!(
            "ref_pt: {}\nobj_pt: {}",
            fmt_pt(&self.ref_pt, self.ref_virtual),
            fmt_pt(&self.obj_pt, self.obj_virtual)
        )
    }
}

/// Unit direction of the construction beam at `pt`.
fn construction_dir(
    pt: &Vector3<f64>,
    source: &[f64; 3],
    is_virtual: bool,
) -> Result<Vector3<f64>, DiffractionError> {
    let dir = (pt - Vector3::from(*source))
        .try_normalize(f64::EPSILON)
        .ok_or(DiffractionError::DegenerateConstructionPoint)?;
    Ok(if is_virtual { -dir } else { dir })
}

impl PhaseElement for HolographicElement {
    fn label(&self) -> &str {
        &self.label
    }

    fn reference_wavelength(&self) -> f64 {
        self.ref_wl
    }

    /// Redirect a ray. Holograms contribute no tracked phase, so the
    /// returned phase is always zero.
    fn phase(
        &self,
        pt: &Vector3<f64>,
        in_dir: &Vector3<f64>,
        srf_nrml: &Vector3<f64>,
        wl: Option<f64>,
    ) -> Result<PhaseResult, DiffractionError> {
        let normal = oriented_normal(srf_nrml, in_dir)?;
        let mu = wavelength_scale(wl, self.ref_wl)?;

        let ref_dir = construction_dir(pt, &self.ref_pt, self.ref_virtual)?;
        let obj_dir = construction_dir(pt, &self.obj_pt, self.obj_virtual)?;

        let ref_cos_i = ref_dir.dot(&normal);
        let obj_cos_i = obj_dir.dot(&normal);
        let in_cos_i = in_dir.dot(&normal);
        let b = in_cos_i + mu * (obj_cos_i - ref_cos_i);

        let refp_cos_i = ref_dir.dot(in_dir);
        let objp_cos_i = obj_dir.dot(in_dir);
        let ro_cos_i = ref_dir.dot(&obj_dir);
        let c = mu * (mu * (1.0 - ro_cos_i) + (objp_cos_i - refp_cos_i));

        let q = solve_eikonal(b, c)?;
        let out_dir = in_dir + mu * (obj_dir - ref_dir) + q * normal;
        Ok(PhaseResult {
            out_dir,
            phase: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_virtual_flag_flips_direction() {
        let pt = Vector3::new(0.0, 0.0, 0.0);
        let real = construction_dir(&pt, &[0.0, 0.0, -10.0], false).unwrap();
        let virt = construction_dir(&pt, &[0.0, 0.0, -10.0], true).unwrap();
        assert_abs_diff_eq!(real.z, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(virt.z, -1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_point_on_construction_point_is_rejected() {
        let hoe = HolographicElement {
            obj_pt: [0.0, 0.0, 0.0],
            ..Default::default()
        };
        let z = Vector3::new(0.0, 0.0, 1.0);
        assert_eq!(
            hoe.phase(&Vector3::zeros(), &z, &z, None),
            Err(DiffractionError::DegenerateConstructionPoint)
        );
    }

    #[test]
    fn test_list_hoe_has_both_points() {
        let text = HolographicElement::default().list_hoe();
        assert!(text.starts_with("ref_pt:"));
        assert!(text.contains("\nobj_pt:"));
    }
}
