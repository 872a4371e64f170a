use meridian_geometry::Transform;
use meridian_materials::RenderColor;
use serde::{Deserialize, Serialize};

use super::{live_interface, restore_interface, transform_at, ElementError, Outline, OutlineKind};
use crate::sequential::{Interface, InterfaceId, InterfaceKind, SequentialModel};

fn thin_color() -> RenderColor {
    RenderColor::LIGHT_GREY
}

/// An idealised thin lens: power without thickness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinElement {
    #[serde(default)]
    pub label: String,
    pub intrfc_indx: usize,
    pub sd: f64,
    #[serde(default = "thin_color")]
    pub render_color: RenderColor,
    #[serde(skip)]
    intrfc: Option<InterfaceId>,
    #[serde(skip)]
    pub tfrm: Transform,
}

impl ThinElement {
    pub(crate) fn from_sequence(seq: &SequentialModel, index: usize, sd: f64, tfrm: Transform) -> Self {
        Self {
            intrfc_indx: index,
            intrfc: seq.interface(index).map(Interface::id),
            tfrm,
            ..Self::blank(sd)
        }
    }

    pub fn detached(ifc: &Interface, sd: f64) -> Self {
        Self {
            label: "ThinLens".to_string(),
            intrfc: Some(ifc.id()),
            ..Self::blank(sd)
        }
    }

    fn blank(sd: f64) -> Self {
        Self {
            label: String::new(),
            intrfc_indx: 0,
            sd,
            render_color: RenderColor::LIGHT_GREY,
            intrfc: None,
            tfrm: Transform::default(),
        }
    }

    pub fn reference_interface(&self) -> Option<InterfaceId> {
        self.intrfc
    }

    /// Optical power of the wrapped thin lens.
    pub fn power(&self, seq: &SequentialModel) -> Result<f64, ElementError> {
        let (_, ifc) = live_interface(seq, self.intrfc, &self.label)?;
        Ok(match ifc.kind {
            InterfaceKind::ThinLens { power } => power,
            InterfaceKind::Surface => 0.0,
        })
    }

    pub fn update_size(&mut self, seq: &SequentialModel) -> Result<f64, ElementError> {
        let (_, ifc) = live_interface(seq, self.intrfc, &self.label)?;
        self.sd = ifc.surface_od();
        Ok(self.sd)
    }

    pub fn sync_to_restore(
        &mut self,
        seq: &SequentialModel,
        tfrms: &[Transform],
    ) -> Result<(), ElementError> {
        self.intrfc = Some(restore_interface(seq, self.intrfc_indx, &self.label)?);
        self.tfrm = transform_at(tfrms, self.intrfc_indx);
        Ok(())
    }

    pub fn sync_to_update(&mut self, seq: &SequentialModel) -> Result<(), ElementError> {
        let (indx, _) = live_interface(seq, self.intrfc, &self.label)?;
        self.intrfc_indx = indx;
        Ok(())
    }

    pub fn shape(&self, seq: &SequentialModel) -> Result<Outline, ElementError> {
        let (_, ifc) = live_interface(seq, self.intrfc, &self.label)?;
        Ok(Outline {
            points: ifc.full_profile((-self.sd, self.sd), None, 1.0),
            kind: OutlineKind::Polyline,
        })
    }

    pub fn describe(&self, seq: &SequentialModel) -> String {
        match self.power(seq) {
            Ok(power) => format!("ThinElement: power={:.6}, sd={:.4}", power, self.sd),
            Err(_) => format!("ThinElement (detached): s{}", self.intrfc_indx),
        }
    }
}
