//! Compound lens elements: two refracting faces with glass between them.

use meridian_geometry::Transform;
use meridian_materials::{glass_render_color, RenderColor};
use serde::{Deserialize, Serialize};

use super::{
    close_polygon, live_gap, live_interface, restore_gap, restore_interface, transform_at,
    ElementError, Outline, OutlineKind,
};
use crate::sequential::{Gap, GapId, Interface, InterfaceId, SequentialModel};

/// A face gets an edge flat when its aperture is at least this fraction
/// smaller than the element's semi-diameter.
const FLAT_THRESHOLD: f64 = 0.05;

/// A lens spanning front face `s1` to rear face `s2`.
///
/// Buried reflectors (the back of a Mangin mirror, the faces of a prism)
/// are absorbed into the span: they appear in `buried_indices` and each adds
/// one internal gap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lens {
    #[serde(default)]
    pub label: String,
    pub s1_indx: usize,
    pub s2_indx: usize,
    /// Internal gaps, front to back.
    #[serde(default)]
    pub gap_indices: Vec<usize>,
    #[serde(default)]
    pub buried_indices: Vec<usize>,
    sd: f64,
    pub edge_extent: (f64, f64),
    /// Edge-flat height of the front face, if any.
    #[serde(default)]
    pub flat1: Option<f64>,
    /// Edge-flat height of the rear face, if any.
    #[serde(default)]
    pub flat2: Option<f64>,
    #[serde(default)]
    pub render_color: RenderColor,
    #[serde(skip)]
    s1: Option<InterfaceId>,
    #[serde(skip)]
    s2: Option<InterfaceId>,
    #[serde(skip)]
    buried: Vec<InterfaceId>,
    #[serde(skip)]
    gaps: Vec<GapId>,
    #[serde(skip)]
    pub tfrm: Transform,
}

impl Lens {
    /// The lens formed by interfaces `index`, `index + 1` and gap `index`.
    pub(crate) fn from_sequence(
        seq: &SequentialModel,
        index: usize,
        sd: f64,
        tfrm: Transform,
    ) -> Self {
        let medium_code = seq.gap(index).and_then(|g| g.medium.glass_code());
        let mut lens = Self::blank(sd);
        lens.s1_indx = index;
        lens.s2_indx = index + 1;
        lens.gap_indices = vec![index];
        lens.s1 = seq.interface(index).map(Interface::id);
        lens.s2 = seq.interface(index + 1).map(Interface::id);
        lens.gaps = seq.gap(index).map(Gap::id).into_iter().collect();
        lens.render_color = glass_render_color(medium_code);
        lens.tfrm = tfrm;
        lens
    }

    /// A lens bound to interfaces that are not yet in a sequential model.
    /// Its indices are filled in by the next refresh.
    pub fn detached(s1: &Interface, s2: &Interface, gap: &Gap, sd: f64) -> Self {
        let mut lens = Self::blank(sd);
        lens.label = "Lens".to_string();
        lens.s1 = Some(s1.id());
        lens.s2 = Some(s2.id());
        lens.gaps = vec![gap.id()];
        lens.render_color = glass_render_color(gap.medium.glass_code());
        lens
    }

    fn blank(sd: f64) -> Self {
        Self {
            label: String::new(),
            s1_indx: 0,
            s2_indx: 1,
            gap_indices: Vec::new(),
            buried_indices: Vec::new(),
            sd,
            edge_extent: (-sd, sd),
            flat1: None,
            flat2: None,
            render_color: RenderColor::NEUTRAL,
            s1: None,
            s2: None,
            buried: Vec::new(),
            gaps: Vec::new(),
            tfrm: Transform::default(),
        }
    }

    /// Extend the span past a reflector buried at interface `index`.
    ///
    /// The reflector becomes internal, gap `index` joins the element and
    /// the next interface becomes the rear face.
    pub(crate) fn absorb_buried(&mut self, seq: &SequentialModel, index: usize) {
        self.buried_indices.push(index);
        self.buried.extend(seq.interface(index).map(Interface::id));
        self.gap_indices.push(index);
        self.gaps.extend(seq.gap(index).map(Gap::id));
        self.s2_indx = index + 1;
        self.s2 = seq.interface(index + 1).map(Interface::id);
        if let Some(s2) = seq.interface(index + 1) {
            self.sd = self.sd.max(s2.surface_od());
            self.edge_extent = (-self.sd, self.sd);
        }
    }

    pub fn sd(&self) -> f64 {
        self.sd
    }

    /// Set the semi-diameter; the edge extent follows it.
    pub fn set_sd(&mut self, semidiam: f64) {
        self.sd = semidiam;
        self.edge_extent = (-semidiam, semidiam);
    }

    pub fn reference_interface(&self) -> Option<InterfaceId> {
        self.s1
    }

    /// Front face, buried reflectors, rear face.
    pub fn interface_indices(&self) -> Vec<usize> {
        let mut indices = Vec::with_capacity(self.buried_indices.len() + 2);
        indices.push(self.s1_indx);
        indices.extend(&self.buried_indices);
        indices.push(self.s2_indx);
        indices
    }

    /// Shape factor $(c_1 + c_2)/(c_1 - c_2)$; zero when the faces have
    /// equal curvature.
    pub fn get_bending(&self, seq: &SequentialModel) -> Result<f64, ElementError> {
        let (_, s1) = live_interface(seq, self.s1, &self.label)?;
        let (_, s2) = live_interface(seq, self.s2, &self.label)?;
        let cv1 = s1.profile_cv();
        let cv2 = s2.profile_cv();
        let delta_cv = cv1 - cv2;
        if delta_cv == 0.0 {
            return Ok(0.0);
        }
        Ok((cv1 + cv2) / delta_cv)
    }

    /// Re-bend the lens, keeping $c_1 - c_2$ (and so its thin-lens power).
    pub fn set_bending(&self, seq: &mut SequentialModel, bending: f64) -> Result<(), ElementError> {
        let (i1, cv1) = live_interface(seq, self.s1, &self.label).map(|(i, s)| (i, s.profile_cv()))?;
        let (i2, cv2) = live_interface(seq, self.s2, &self.label).map(|(i, s)| (i, s.profile_cv()))?;
        let delta_cv = cv1 - cv2;
        let cv2_new = 0.5 * (bending - 1.0) * delta_cv;
        let cv1_new = bending * delta_cv - cv2_new;
        if let Some(s1) = seq.interface_mut(i1) {
            s1.set_profile_cv(cv1_new);
        }
        if let Some(s2) = seq.interface_mut(i2) {
            s2.set_profile_cv(cv2_new);
        }
        Ok(())
    }

    /// Axial distance from the front to the rear vertex.
    pub fn thickness(&self, seq: &SequentialModel) -> Result<f64, ElementError> {
        self.gaps.iter().try_fold(0.0, |sum, id| {
            live_gap(seq, Some(*id), &self.label).map(|(_, g)| sum + g.thi)
        })
    }

    /// Set the centre thickness (the first internal gap).
    pub fn set_thickness(&self, seq: &mut SequentialModel, thi: f64) -> Result<(), ElementError> {
        let (i, _) = live_gap(seq, self.gaps.first().copied(), &self.label)?;
        if let Some(g) = seq.gap_mut(i) {
            g.thi = thi;
        }
        Ok(())
    }

    pub fn update_size(&mut self, seq: &SequentialModel) -> Result<f64, ElementError> {
        let (_, s1) = live_interface(seq, self.s1, &self.label)?;
        let (_, s2) = live_interface(seq, self.s2, &self.label)?;
        let (lwr1, upr1) = s1.y_aperture_extent();
        let (lwr2, upr2) = s2.y_aperture_extent();

        let mut sd = s1.surface_od().max(s2.surface_od());
        for id in &self.buried {
            let (_, buried) = live_interface(seq, Some(*id), &self.label)?;
            sd = sd.max(buried.surface_od());
        }
        self.sd = sd;
        self.edge_extent = (lwr1.min(lwr2).min(-sd), upr1.max(upr2).max(sd));
        self.flat1 = if s1.profile_cv() < 0.0 {
            self.compute_flat(s1)
        } else {
            None
        };
        self.flat2 = if s2.profile_cv() > 0.0 {
            self.compute_flat(s2)
        } else {
            None
        };
        Ok(self.sd)
    }

    fn compute_flat(&self, s: &Interface) -> Option<f64> {
        let ca = s.surface_od();
        if self.sd > 0.0 && 1.0 - ca / self.sd >= FLAT_THRESHOLD {
            Some(ca)
        } else {
            None
        }
    }

    pub fn sync_to_restore(
        &mut self,
        seq: &SequentialModel,
        tfrms: &[Transform],
    ) -> Result<(), ElementError> {
        if self.gap_indices.is_empty() {
            self.gap_indices.push(self.s1_indx);
        }
        self.s1 = Some(restore_interface(seq, self.s1_indx, &self.label)?);
        self.s2 = Some(restore_interface(seq, self.s2_indx, &self.label)?);
        self.buried = self
            .buried_indices
            .iter()
            .map(|&i| restore_interface(seq, i, &self.label))
            .collect::<Result<_, _>>()?;
        self.gaps = self
            .gap_indices
            .iter()
            .map(|&i| restore_gap(seq, i, &self.label))
            .collect::<Result<_, _>>()?;
        self.tfrm = transform_at(tfrms, self.s1_indx);
        Ok(())
    }

    pub fn sync_to_update(&mut self, seq: &SequentialModel) -> Result<(), ElementError> {
        let (s1_indx, _) = live_interface(seq, self.s1, &self.label)?;
        let (s2_indx, _) = live_interface(seq, self.s2, &self.label)?;
        let buried_indices = self
            .buried
            .iter()
            .map(|id| live_interface(seq, Some(*id), &self.label).map(|(i, _)| i))
            .collect::<Result<Vec<_>, _>>()?;
        let gap_indices = self
            .gaps
            .iter()
            .map(|id| live_gap(seq, Some(*id), &self.label).map(|(i, _)| i))
            .collect::<Result<Vec<_>, _>>()?;

        self.s1_indx = s1_indx;
        self.s2_indx = s2_indx;
        self.buried_indices = buried_indices;
        self.gap_indices = gap_indices;
        self.render_color = self.calc_render_color(seq);
        Ok(())
    }

    /// Colour from the glass's Abbe number, neutral when it has none.
    pub fn calc_render_color(&self, seq: &SequentialModel) -> RenderColor {
        let code = live_gap(seq, self.gaps.first().copied(), &self.label)
            .ok()
            .and_then(|(_, g)| g.medium.glass_code());
        glass_render_color(code)
    }

    /// Closed outline: the front face bottom to top, then the rear face
    /// traced back down, offset by the element thickness.
    pub fn shape(&self, seq: &SequentialModel) -> Result<Outline, ElementError> {
        let (_, s1) = live_interface(seq, self.s1, &self.label)?;
        let (_, s2) = live_interface(seq, self.s2, &self.label)?;
        let thi = self.thickness(seq)?;

        let mut poly = s1.full_profile(self.edge_extent, self.flat1, 1.0);
        let rear = s2.full_profile(self.edge_extent, self.flat2, -1.0);
        poly.extend(rear.into_iter().map(|[z, y]| [z + thi, y]));
        Ok(Outline {
            points: close_polygon(poly),
            kind: OutlineKind::Polygon,
        })
    }

    pub fn describe(&self, seq: &SequentialModel) -> String {
        let faces = live_interface(seq, self.s1, &self.label)
            .and_then(|(_, s1)| live_interface(seq, self.s2, &self.label).map(|(_, s2)| (s1, s2)));
        let glass = live_gap(seq, self.gaps.first().copied(), &self.label)
            .map(|(_, g)| g.medium.name().to_string());
        match (faces, self.thickness(seq), glass) {
            (Ok((s1, s2)), Ok(thi), Ok(glass)) => format!(
                "Lens: cv1={:.6}, cv2={:.6}, t={:.4}, sd={:.4}, glass: {}",
                s1.profile_cv(),
                s2.profile_cv(),
                thi,
                self.sd,
                glass
            ),
            _ => format!(
                "Lens (detached): s{}-s{}, sd={:.4}",
                self.s1_indx, self.s2_indx, self.sd
            ),
        }
    }
}
