//! TOML configuration deserialisation for lens prescriptions and
//! diffractive surfaces.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use meridian_core::sequential::{Gap, Interface, RefractMode, SequentialModel};
use meridian_geometry::Profile;
use meridian_materials::{air, Medium, ModelGlass};

/// Top-level lens prescription.
///
/// The first surface is the object and the last the image. Every surface
/// but the last carries the gap that follows it.
#[derive(Debug, Deserialize)]
pub struct LensConfig {
    /// Index of the aperture stop surface.
    #[serde(default)]
    pub stop_surface: Option<usize>,
    #[serde(default)]
    pub glass: Vec<GlassConfig>,
    pub surface: Vec<SurfaceConfig>,
}

/// A catalogue-free glass given by its d-line index and Abbe number.
#[derive(Debug, Deserialize)]
pub struct GlassConfig {
    pub name: String,
    pub nd: f64,
    pub vd: f64,
}

/// One surface and the gap after it.
#[derive(Debug, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default)]
    pub label: String,
    /// Vertex curvature; ignored when `radius` is given.
    #[serde(default)]
    pub curvature: f64,
    /// Vertex radius; zero means flat.
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub conic: f64,
    #[serde(default)]
    pub mode: ModeConfig,
    #[serde(default = "default_semi_diameter")]
    pub semi_diameter: f64,
    /// Model the surface as an ideal thin lens of this power.
    #[serde(default)]
    pub thin_lens_power: Option<f64>,
    #[serde(default)]
    pub thickness: f64,
    /// "air" or the name of a `[[glass]]` entry.
    #[serde(default = "default_medium")]
    pub medium: String,
}

/// Interaction of a ray with a surface.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeConfig {
    #[default]
    Refract,
    Reflect,
    None,
}

impl From<ModeConfig> for RefractMode {
    fn from(mode: ModeConfig) -> Self {
        match mode {
            ModeConfig::Refract => RefractMode::Refract,
            ModeConfig::Reflect => RefractMode::Reflect,
            ModeConfig::None => RefractMode::None,
        }
    }
}

fn default_semi_diameter() -> f64 {
    1.0
}
fn default_medium() -> String {
    "air".into()
}

/// A diffractive surface and the ray to send through it.
#[derive(Debug, Deserialize)]
pub struct DoeFile {
    pub doe: DoeConfig,
}

#[derive(Debug, Deserialize)]
pub struct DoeConfig {
    #[serde(default)]
    pub label: String,
    /// Radial phase coefficients, lowest power of r^2 first.
    pub coefficients: Vec<f64>,
    #[serde(default = "default_ref_wl")]
    pub ref_wl: f64,
    #[serde(default = "default_order")]
    pub order: i32,
    /// Ray intersection point on the surface.
    #[serde(default)]
    pub point: [f64; 3],
    #[serde(default = "default_axis")]
    pub direction: [f64; 3],
    #[serde(default = "default_axis")]
    pub normal: [f64; 3],
    /// Trace wavelength (nm); defaults to `ref_wl`.
    #[serde(default)]
    pub wavelength: Option<f64>,
}

fn default_ref_wl() -> f64 {
    550.0
}
fn default_order() -> i32 {
    1
}
fn default_axis() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

/// Load and parse a TOML lens prescription.
pub fn load_lens(path: &std::path::Path) -> Result<LensConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Reading {}", path.display()))?;
    let config: LensConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load and parse a TOML diffractive-surface description.
pub fn load_doe(path: &std::path::Path) -> Result<DoeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Reading {}", path.display()))?;
    let file: DoeFile = toml::from_str(&content)?;
    Ok(file.doe)
}

fn medium_key(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

/// Build the sequential model described by a prescription.
///
/// Gaps naming the same glass share one medium.
pub fn build_sequence(config: &LensConfig) -> Result<SequentialModel> {
    if config.surface.len() < 2 {
        anyhow::bail!("A lens needs at least an object and an image surface");
    }

    let mut media: HashMap<String, Arc<dyn Medium>> = HashMap::new();
    for g in &config.glass {
        if g.nd < 1.0 || g.vd <= 0.0 {
            anyhow::bail!("Glass '{}': nd must be at least 1 and vd positive", g.name);
        }
        media.insert(medium_key(&g.name), Arc::new(ModelGlass::new(g.name.clone(), g.nd, g.vd)));
    }

    let last = config.surface.len() - 1;
    let mut interfaces = Vec::with_capacity(config.surface.len());
    let mut gaps = Vec::with_capacity(last);
    for (i, s) in config.surface.iter().enumerate() {
        interfaces.push(build_interface(s));
        if i < last {
            let medium = resolve_medium(&media, &s.medium)
                .with_context(|| format!("Surface {}", i))?;
            gaps.push(Gap::new(s.thickness, medium));
        }
    }

    SequentialModel::from_parts(interfaces, gaps, config.stop_surface)
        .context("Invalid lens description")
}

fn build_interface(s: &SurfaceConfig) -> Interface {
    let ifc = match s.thin_lens_power {
        Some(power) => Interface::thin_lens(power),
        None => {
            let cv = match s.radius {
                Some(r) if r != 0.0 => 1.0 / r,
                Some(_) => 0.0,
                None => s.curvature,
            };
            Interface::new(Profile::conic(cv, s.conic)).with_mode(s.mode.into())
        }
    };
    ifc.with_label(s.label.clone()).with_aperture(s.semi_diameter)
}

fn resolve_medium(media: &HashMap<String, Arc<dyn Medium>>, name: &str) -> Result<Arc<dyn Medium>> {
    let key = medium_key(name);
    if key == "air" {
        return Ok(air());
    }
    media.get(&key).cloned().ok_or_else(|| {
        anyhow::anyhow!("Unknown medium '{}'. Declare it in a [[glass]] table", name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SINGLET: &str = r#"
        stop_surface = 1

        [[glass]]
        name = "N-BK7"
        nd = 1.5168
        vd = 64.17

        [[surface]]
        label = "Obj"
        mode = "none"
        thickness = 1e10

        [[surface]]
        radius = 50.0
        semi_diameter = 12.5
        thickness = 4.0
        medium = "n-bk7"

        [[surface]]
        curvature = -0.02
        semi_diameter = 12.5
        thickness = 45.0

        [[surface]]
        label = "Img"
        mode = "none"
    "#;

    #[test]
    fn test_singlet_builds_sequence() {
        let config: LensConfig = toml::from_str(SINGLET).unwrap();
        let seq = build_sequence(&config).unwrap();

        assert_eq!(seq.interface_count(), 4);
        assert_eq!(seq.stop_surface(), Some(1));
        assert_relative_eq!(seq.interface(1).unwrap().profile_cv(), 0.02);
        assert_relative_eq!(seq.interface(1).unwrap().max_aperture, 12.5);
        assert_eq!(seq.interface(0).unwrap().refract_mode, RefractMode::None);
        assert_eq!(seq.gap(1).unwrap().medium.name(), "N-BK7");
        assert!(seq.gap(2).unwrap().is_air());
    }

    #[test]
    fn test_unknown_medium_is_reported() {
        let config: LensConfig = toml::from_str(
            r#"
            [[surface]]
            medium = "unobtainium"
            [[surface]]
            "#,
        )
        .unwrap();
        let err = build_sequence(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("unobtainium"));
    }

    #[test]
    fn test_doe_defaults() {
        let file: DoeFile = toml::from_str("[doe]\ncoefficients = [0.1]\n").unwrap();
        assert_eq!(file.doe.order, 1);
        assert_relative_eq!(file.doe.ref_wl, 550.0);
        assert_eq!(file.doe.direction, [0.0, 0.0, 1.0]);
        assert!(file.doe.wavelength.is_none());
    }
}
