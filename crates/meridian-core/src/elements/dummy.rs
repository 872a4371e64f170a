use meridian_geometry::Transform;
use meridian_materials::RenderColor;
use serde::{Deserialize, Serialize};

use super::{live_interface, restore_interface, transform_at, ElementError, Outline, OutlineKind};
use crate::sequential::{Interface, InterfaceId, SequentialModel};

/// A surface that belongs to no optical element: the object, the image,
/// the aperture stop, or any surface with air on both sides, curved or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DummyInterface {
    #[serde(default)]
    pub label: String,
    pub idx: usize,
    pub sd: f64,
    #[serde(default)]
    pub render_color: RenderColor,
    #[serde(skip)]
    ifc: Option<InterfaceId>,
    #[serde(skip)]
    pub tfrm: Transform,
}

impl DummyInterface {
    pub(crate) fn from_sequence(
        seq: &SequentialModel,
        index: usize,
        label: impl Into<String>,
        sd: f64,
        tfrm: Transform,
    ) -> Self {
        Self {
            label: label.into(),
            idx: index,
            sd,
            render_color: RenderColor::NEUTRAL,
            ifc: seq.interface(index).map(Interface::id),
            tfrm,
        }
    }

    pub fn detached(ifc: &Interface, sd: f64) -> Self {
        Self {
            label: "DummyInterface".to_string(),
            idx: 0,
            sd,
            render_color: RenderColor::NEUTRAL,
            ifc: Some(ifc.id()),
            tfrm: Transform::default(),
        }
    }

    pub fn reference_interface(&self) -> Option<InterfaceId> {
        self.ifc
    }

    pub fn update_size(&mut self, seq: &SequentialModel) -> Result<f64, ElementError> {
        let (_, ifc) = live_interface(seq, self.ifc, &self.label)?;
        self.sd = ifc.surface_od();
        Ok(self.sd)
    }

    /// Thicknesses of the gaps before and after the plane. The object
    /// plane has no gap before it and the image plane none after.
    pub fn adjacent_spaces(
        &self,
        seq: &SequentialModel,
    ) -> Result<(Option<f64>, Option<f64>), ElementError> {
        let (idx, _) = live_interface(seq, self.ifc, &self.label)?;
        let before = idx.checked_sub(1).and_then(|i| seq.gap(i)).map(|g| g.thi);
        let after = seq.gap(idx).map(|g| g.thi);
        Ok((before, after))
    }

    /// Move the plane by `delta` along the axis, keeping the surrounding
    /// interfaces where they are.
    pub fn slide(&self, seq: &mut SequentialModel, delta: f64) -> Result<(), ElementError> {
        let (idx, _) = live_interface(seq, self.ifc, &self.label)?;
        if let Some(before) = idx.checked_sub(1).and_then(|i| seq.gap_mut(i)) {
            before.thi += delta;
        }
        if let Some(after) = seq.gap_mut(idx) {
            after.thi -= delta;
        }
        Ok(())
    }

    pub fn sync_to_restore(
        &mut self,
        seq: &SequentialModel,
        tfrms: &[Transform],
    ) -> Result<(), ElementError> {
        self.ifc = Some(restore_interface(seq, self.idx, &self.label)?);
        self.tfrm = transform_at(tfrms, self.idx);
        Ok(())
    }

    pub fn sync_to_update(&mut self, seq: &SequentialModel) -> Result<(), ElementError> {
        let (idx, _) = live_interface(seq, self.ifc, &self.label)?;
        self.idx = idx;
        Ok(())
    }

    pub fn shape(&self, seq: &SequentialModel) -> Result<Outline, ElementError> {
        let (_, ifc) = live_interface(seq, self.ifc, &self.label)?;
        Ok(Outline {
            points: ifc.full_profile((-self.sd, self.sd), None, 1.0),
            kind: OutlineKind::Polyline,
        })
    }

    pub fn describe(&self, _seq: &SequentialModel) -> String {
        format!("DummyInterface: s{}, sd={:.4}", self.idx, self.sd)
    }
}
