use meridian_geometry::Transform;
use serde::{Deserialize, Serialize};

use super::{
    live_gap, restore_gap, restore_interface, transform_at, ElementError, Outline, OutlineKind,
};
use crate::sequential::{Gap, GapId, Interface, InterfaceId, SequentialModel};

/// An editable air space. Gap `idx` follows interface `idx`, which orders
/// and places the entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirGap {
    #[serde(default)]
    pub label: String,
    pub idx: usize,
    #[serde(skip)]
    g: Option<GapId>,
    #[serde(skip)]
    ifc: Option<InterfaceId>,
    #[serde(skip)]
    pub tfrm: Transform,
}

impl AirGap {
    pub(crate) fn from_sequence(seq: &SequentialModel, index: usize, tfrm: Transform) -> Self {
        Self {
            label: "AirGap".to_string(),
            idx: index,
            g: seq.gap(index).map(Gap::id),
            ifc: seq.interface(index).map(Interface::id),
            tfrm,
        }
    }

    pub fn reference_interface(&self) -> Option<InterfaceId> {
        self.ifc
    }

    pub fn thickness(&self, seq: &SequentialModel) -> Result<f64, ElementError> {
        live_gap(seq, self.g, &self.label).map(|(_, g)| g.thi)
    }

    pub fn set_thickness(&self, seq: &mut SequentialModel, thi: f64) -> Result<(), ElementError> {
        let (i, _) = live_gap(seq, self.g, &self.label)?;
        if let Some(g) = seq.gap_mut(i) {
            g.thi = thi;
        }
        Ok(())
    }

    pub fn sync_to_restore(
        &mut self,
        seq: &SequentialModel,
        tfrms: &[Transform],
    ) -> Result<(), ElementError> {
        self.g = Some(restore_gap(seq, self.idx, &self.label)?);
        self.ifc = Some(restore_interface(seq, self.idx, &self.label)?);
        self.tfrm = transform_at(tfrms, self.idx);
        Ok(())
    }

    pub fn sync_to_update(&mut self, seq: &SequentialModel) -> Result<(), ElementError> {
        let (idx, _) = live_gap(seq, self.g, &self.label)?;
        self.idx = idx;
        self.ifc = seq.interface(idx).map(Interface::id);
        Ok(())
    }

    /// The centre-thickness segment along the axis.
    pub fn shape(&self, seq: &SequentialModel) -> Result<Outline, ElementError> {
        let thi = self.thickness(seq)?;
        Ok(Outline {
            points: vec![[0.0, 0.0], [thi, 0.0]],
            kind: OutlineKind::Polyline,
        })
    }

    pub fn describe(&self, seq: &SequentialModel) -> String {
        match self.thickness(seq) {
            Ok(thi) => format!("AirGap: t={:.4}", thi),
            Err(_) => format!("AirGap (detached): g{}", self.idx),
        }
    }
}
