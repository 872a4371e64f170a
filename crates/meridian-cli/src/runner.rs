//! Command runner: ties together the lens description, the element model
//! and the phase-transfer kernel.

use std::path::Path;

use anyhow::{Context, Result};
use nalgebra::Vector3;

use meridian_core::doe::{DiffractiveElement, PhaseElement, PhaseResult};
use meridian_core::elements::{ElementModel, OutlineKind};
use meridian_core::sequential::SequentialModel;

use crate::config::DoeConfig;

/// Group a sequential model into elements, or restore a saved grouping.
pub fn group_elements(seq: &SequentialModel, restore: Option<&Path>) -> Result<ElementModel> {
    let mut em = match restore {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Reading {}", path.display()))?;
            let mut em: ElementModel = serde_json::from_str(&json)
                .with_context(|| format!("Parsing element model {}", path.display()))?;
            em.sync_to_restore(seq)
                .with_context(|| format!("Restoring {}", path.display()))?;
            em
        }
        None => {
            let mut em = ElementModel::new();
            em.elements_from_sequence(seq);
            em
        }
    };

    let stale = em.update_model(seq);
    if !stale.is_empty() {
        log::warn!("{} elements no longer match the lens", stale.len());
    }
    Ok(em)
}

/// Write an element model to a JSON file.
pub fn write_elements_json(em: &ElementModel, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(em)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("Elements written to: {}", path.display());
    Ok(())
}

/// Write every element outline to a CSV file, one row per vertex.
pub fn write_outlines_csv(em: &ElementModel, seq: &SequentialModel, path: &Path) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    writeln!(file, "# Meridian element outlines")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "element,label,kind,closed,z_mm,y_mm")?;

    for (i, e) in em.elements.iter().enumerate() {
        let outline = match e.shape(seq) {
            Ok(outline) => outline,
            Err(err) => {
                log::warn!("Skipping outline: {}", err);
                continue;
            }
        };
        let closed = outline.kind == OutlineKind::Polygon;
        let tfrm = e.transform();
        for [z, y] in outline.points {
            let [_, gy, gz] = tfrm.apply(&[0.0, y, z]);
            writeln!(file, "{},{},{},{},{:.6},{:.6}", i, e.label(), e.kind(), closed, gz, gy)?;
        }
    }

    println!("Outlines written to: {}", path.display());
    Ok(())
}

/// Trace the configured ray through the configured diffractive surface.
pub fn run_diffraction(cfg: &DoeConfig) -> Result<(DiffractiveElement, PhaseResult)> {
    let doe = DiffractiveElement {
        label: cfg.label.clone(),
        order: cfg.order,
        ..DiffractiveElement::new(cfg.coefficients.clone(), cfg.ref_wl)
    };

    let direction = Vector3::from(cfg.direction)
        .try_normalize(f64::EPSILON)
        .context("Ray direction has zero length")?;
    let result = doe
        .phase(
            &Vector3::from(cfg.point),
            &direction,
            &Vector3::from(cfg.normal),
            cfg.wavelength,
        )
        .context("Diffraction failed")?;
    Ok((doe, result))
}
