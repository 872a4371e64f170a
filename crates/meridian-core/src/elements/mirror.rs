use meridian_geometry::Transform;
use meridian_materials::RenderColor;
use serde::{Deserialize, Serialize};

use super::{
    close_polygon, live_interface, restore_interface, transform_at, ElementError, Outline,
    OutlineKind,
};
use crate::sequential::{Interface, InterfaceId, SequentialModel};

/// Substrate thickness as a fraction of the semi-diameter, used when no
/// explicit thickness is set.
const THICKNESS_RATIO: f64 = 0.05;

fn mirror_color() -> RenderColor {
    RenderColor::MIRROR
}

/// A front-surface mirror on a synthesised substrate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mirror {
    #[serde(default)]
    pub label: String,
    pub s_indx: usize,
    /// Propagation sign after reflection; the substrate is drawn on the
    /// far side.
    pub z_dir: f64,
    pub sd: f64,
    /// Explicit substrate thickness.
    #[serde(default)]
    pub thi: Option<f64>,
    pub edge_extent: (f64, f64),
    #[serde(default)]
    pub flat: Option<f64>,
    #[serde(default = "mirror_color")]
    pub render_color: RenderColor,
    #[serde(skip)]
    s: Option<InterfaceId>,
    #[serde(skip)]
    pub tfrm: Transform,
}

impl Mirror {
    pub(crate) fn from_sequence(
        seq: &SequentialModel,
        index: usize,
        sd: f64,
        z_dir: f64,
        tfrm: Transform,
    ) -> Self {
        Self {
            s_indx: index,
            s: seq.interface(index).map(Interface::id),
            tfrm,
            ..Self::blank(sd, z_dir)
        }
    }

    /// A mirror bound to an interface that is not yet in a sequential model.
    pub fn detached(ifc: &Interface, sd: f64, thi: Option<f64>, z_dir: f64) -> Self {
        Self {
            label: "Mirror".to_string(),
            s: Some(ifc.id()),
            thi,
            ..Self::blank(sd, z_dir)
        }
    }

    fn blank(sd: f64, z_dir: f64) -> Self {
        Self {
            label: String::new(),
            s_indx: 0,
            z_dir,
            sd,
            thi: None,
            edge_extent: (-sd, sd),
            flat: None,
            render_color: RenderColor::MIRROR,
            s: None,
            tfrm: Transform::default(),
        }
    }

    pub fn reference_interface(&self) -> Option<InterfaceId> {
        self.s
    }

    /// Substrate thickness; derived from the current semi-diameter unless
    /// set explicitly.
    pub fn get_thi(&self) -> f64 {
        self.thi.unwrap_or(THICKNESS_RATIO * self.sd)
    }

    pub fn set_edge_extent(&mut self, lower: f64, upper: f64) {
        self.edge_extent = (lower, upper);
    }

    pub fn update_size(&mut self, seq: &SequentialModel) -> Result<f64, ElementError> {
        let (_, s) = live_interface(seq, self.s, &self.label)?;
        self.edge_extent = s.y_aperture_extent();
        self.sd = s.surface_od();
        Ok(self.sd)
    }

    pub fn sync_to_restore(
        &mut self,
        seq: &SequentialModel,
        tfrms: &[Transform],
    ) -> Result<(), ElementError> {
        self.s = Some(restore_interface(seq, self.s_indx, &self.label)?);
        self.z_dir = seq.z_dir(self.s_indx);
        self.tfrm = transform_at(tfrms, self.s_indx);
        Ok(())
    }

    pub fn sync_to_update(&mut self, seq: &SequentialModel) -> Result<(), ElementError> {
        let (s_indx, _) = live_interface(seq, self.s, &self.label)?;
        self.s_indx = s_indx;
        self.z_dir = seq.z_dir(s_indx);
        Ok(())
    }

    pub fn shape(&self, seq: &SequentialModel) -> Result<Outline, ElementError> {
        let (_, s) = live_interface(seq, self.s, &self.label)?;
        let offset = self.get_thi() * self.z_dir;

        let mut poly = s.full_profile(self.edge_extent, self.flat, 1.0);
        let back = s.full_profile(self.edge_extent, self.flat, -1.0);
        poly.extend(back.into_iter().map(|[z, y]| [z + offset, y]));
        Ok(Outline {
            points: close_polygon(poly),
            kind: OutlineKind::Polygon,
        })
    }

    pub fn describe(&self, seq: &SequentialModel) -> String {
        match live_interface(seq, self.s, &self.label) {
            Ok((_, s)) => format!(
                "Mirror: cv={:.6}, sd={:.4}, thi={:.4}",
                s.profile_cv(),
                self.sd,
                self.get_thi()
            ),
            Err(_) => format!("Mirror (detached): s{}, sd={:.4}", self.s_indx, self.sd),
        }
    }
}
