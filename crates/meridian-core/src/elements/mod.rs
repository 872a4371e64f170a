//! Element entities: the editable grouping of a sequential model.
//!
//! An element wraps one or two interfaces (plus the gap between them) of a
//! [`SequentialModel`] and presents them as a single optical component.
//! Elements hold two kinds of references to the model:
//!
//! - **stored indices** (`s1_indx`, `idx`, ...), which are persisted and
//!   survive a save/load cycle, and
//! - **live ids** ([`InterfaceId`], [`GapId`]), which survive structural
//!   edits but not a save/load cycle.
//!
//! Restoring turns stored indices into live ids
//! ([`Element::sync_to_restore`]); refreshing after an edit turns live ids
//! back into current indices ([`Element::sync_to_update`]).

pub mod air_gap;
pub mod dummy;
pub mod factory;
pub mod lens;
pub mod mirror;
pub mod model;
pub mod thin;

pub use air_gap::AirGap;
pub use dummy::DummyInterface;
pub use factory::{create_dummy_plane, create_lens, create_mirror, create_thinlens, MirrorShape};
pub use lens::Lens;
pub use mirror::Mirror;
pub use model::ElementModel;
pub use thin::ThinElement;

use std::fmt;

use meridian_geometry::Transform;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sequential::{Gap, GapId, Interface, InterfaceId, SequentialModel};

/// Errors keeping elements and the sequential model in step.
#[derive(Debug, Error, PartialEq)]
pub enum ElementError {
    #[error("Element '{label}': reference no longer found in the sequential model")]
    StructuralInconsistency { label: String },

    #[error("Element '{label}': stored index {index} is out of range ({count} available)")]
    RestoreIndexOutOfRange {
        label: String,
        index: usize,
        count: usize,
    },
}

/// The five element variants, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Lens,
    Mirror,
    Thin,
    Dummy,
    AirGap,
}

impl ElementKind {
    /// Default label for the `n`th element of this kind (1-based).
    pub fn default_label(self, n: usize) -> String {
        match self {
            ElementKind::Lens => format!("E{}", n),
            ElementKind::Mirror => format!("M{}", n),
            ElementKind::Thin => format!("TL{}", n),
            ElementKind::Dummy => format!("D{}", n),
            ElementKind::AirGap => format!("AirGap {}", n),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Lens => "Lens",
            ElementKind::Mirror => "Mirror",
            ElementKind::Thin => "ThinElement",
            ElementKind::Dummy => "DummyInterface",
            ElementKind::AirGap => "AirGap",
        };
        f.write_str(name)
    }
}

/// Whether an outline is a closed, filled polygon or an open polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineKind {
    Polygon,
    Polyline,
}

/// An element outline in local `[z, y]` coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub points: Vec<[f64; 2]>,
    pub kind: OutlineKind,
}

/// One entry of the element list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Element {
    Lens(Lens),
    Mirror(Mirror),
    Thin(ThinElement),
    Dummy(DummyInterface),
    AirGap(AirGap),
}

impl From<Lens> for Element {
    fn from(e: Lens) -> Self {
        Element::Lens(e)
    }
}

impl From<Mirror> for Element {
    fn from(e: Mirror) -> Self {
        Element::Mirror(e)
    }
}

impl From<ThinElement> for Element {
    fn from(e: ThinElement) -> Self {
        Element::Thin(e)
    }
}

impl From<DummyInterface> for Element {
    fn from(e: DummyInterface) -> Self {
        Element::Dummy(e)
    }
}

impl From<AirGap> for Element {
    fn from(e: AirGap) -> Self {
        Element::AirGap(e)
    }
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Lens(_) => ElementKind::Lens,
            Element::Mirror(_) => ElementKind::Mirror,
            Element::Thin(_) => ElementKind::Thin,
            Element::Dummy(_) => ElementKind::Dummy,
            Element::AirGap(_) => ElementKind::AirGap,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Element::Lens(e) => &e.label,
            Element::Mirror(e) => &e.label,
            Element::Thin(e) => &e.label,
            Element::Dummy(e) => &e.label,
            Element::AirGap(e) => &e.label,
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        match self {
            Element::Lens(e) => e.label = label,
            Element::Mirror(e) => e.label = label,
            Element::Thin(e) => e.label = label,
            Element::Dummy(e) => e.label = label,
            Element::AirGap(e) => e.label = label,
        }
    }

    /// Live id of the interface that orders and places this element.
    pub fn reference_interface(&self) -> Option<InterfaceId> {
        match self {
            Element::Lens(e) => e.reference_interface(),
            Element::Mirror(e) => e.reference_interface(),
            Element::Thin(e) => e.reference_interface(),
            Element::Dummy(e) => e.reference_interface(),
            Element::AirGap(e) => e.reference_interface(),
        }
    }

    /// Stored index of the reference interface.
    pub fn reference_index(&self) -> usize {
        match self {
            Element::Lens(e) => e.s1_indx,
            Element::Mirror(e) => e.s_indx,
            Element::Thin(e) => e.intrfc_indx,
            Element::Dummy(e) => e.idx,
            Element::AirGap(e) => e.idx,
        }
    }

    /// Stored indices of the interfaces this element owns.
    ///
    /// An air gap orders itself by an interface but does not own it.
    pub fn interface_indices(&self) -> Vec<usize> {
        match self {
            Element::Lens(e) => e.interface_indices(),
            Element::Mirror(e) => vec![e.s_indx],
            Element::Thin(e) => vec![e.intrfc_indx],
            Element::Dummy(e) => vec![e.idx],
            Element::AirGap(_) => Vec::new(),
        }
    }

    /// Stored indices of the gaps this element owns.
    pub fn gap_indices(&self) -> Vec<usize> {
        match self {
            Element::Lens(e) => e.gap_indices.clone(),
            Element::AirGap(e) => vec![e.idx],
            _ => Vec::new(),
        }
    }

    /// Cached semi-diameter; air gaps have none.
    pub fn sd(&self) -> Option<f64> {
        match self {
            Element::Lens(e) => Some(e.sd()),
            Element::Mirror(e) => Some(e.sd),
            Element::Thin(e) => Some(e.sd),
            Element::Dummy(e) => Some(e.sd),
            Element::AirGap(_) => None,
        }
    }

    /// Cached outline extent in y, for elements drawn as solids.
    pub fn edge_extent(&self) -> Option<(f64, f64)> {
        match self {
            Element::Lens(e) => Some(e.edge_extent),
            Element::Mirror(e) => Some(e.edge_extent),
            _ => None,
        }
    }

    pub fn transform(&self) -> &Transform {
        match self {
            Element::Lens(e) => &e.tfrm,
            Element::Mirror(e) => &e.tfrm,
            Element::Thin(e) => &e.tfrm,
            Element::Dummy(e) => &e.tfrm,
            Element::AirGap(e) => &e.tfrm,
        }
    }

    pub fn set_transform(&mut self, tfrm: Transform) {
        match self {
            Element::Lens(e) => e.tfrm = tfrm,
            Element::Mirror(e) => e.tfrm = tfrm,
            Element::Thin(e) => e.tfrm = tfrm,
            Element::Dummy(e) => e.tfrm = tfrm,
            Element::AirGap(e) => e.tfrm = tfrm,
        }
    }

    /// Recompute the size caches from live interface apertures and return
    /// the semi-diameter (0 for air gaps).
    pub fn update_size(&mut self, seq: &SequentialModel) -> Result<f64, ElementError> {
        match self {
            Element::Lens(e) => e.update_size(seq),
            Element::Mirror(e) => e.update_size(seq),
            Element::Thin(e) => e.update_size(seq),
            Element::Dummy(e) => e.update_size(seq),
            Element::AirGap(_) => Ok(0.0),
        }
    }

    /// Attach stored indices to live model objects after a load.
    pub fn sync_to_restore(
        &mut self,
        seq: &SequentialModel,
        tfrms: &[Transform],
    ) -> Result<(), ElementError> {
        match self {
            Element::Lens(e) => e.sync_to_restore(seq, tfrms),
            Element::Mirror(e) => e.sync_to_restore(seq, tfrms),
            Element::Thin(e) => e.sync_to_restore(seq, tfrms),
            Element::Dummy(e) => e.sync_to_restore(seq, tfrms),
            Element::AirGap(e) => e.sync_to_restore(seq, tfrms),
        }
    }

    /// Re-derive stored indices from live ids after an edit.
    pub fn sync_to_update(&mut self, seq: &SequentialModel) -> Result<(), ElementError> {
        match self {
            Element::Lens(e) => e.sync_to_update(seq),
            Element::Mirror(e) => e.sync_to_update(seq),
            Element::Thin(e) => e.sync_to_update(seq),
            Element::Dummy(e) => e.sync_to_update(seq),
            Element::AirGap(e) => e.sync_to_update(seq),
        }
    }

    /// Outline in local coordinates of the reference interface.
    pub fn shape(&self, seq: &SequentialModel) -> Result<Outline, ElementError> {
        match self {
            Element::Lens(e) => e.shape(seq),
            Element::Mirror(e) => e.shape(seq),
            Element::Thin(e) => e.shape(seq),
            Element::Dummy(e) => e.shape(seq),
            Element::AirGap(e) => e.shape(seq),
        }
    }

    /// Human-readable summary including live model data.
    pub fn describe(&self, seq: &SequentialModel) -> String {
        match self {
            Element::Lens(e) => e.describe(seq),
            Element::Mirror(e) => e.describe(seq),
            Element::Thin(e) => e.describe(seq),
            Element::Dummy(e) => e.describe(seq),
            Element::AirGap(e) => e.describe(seq),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.kind())
    }
}

/// Look up a live interface by id.
pub(crate) fn live_interface<'a>(
    seq: &'a SequentialModel,
    id: Option<InterfaceId>,
    label: &str,
) -> Result<(usize, &'a Interface), ElementError> {
    id.and_then(|id| seq.interface_index(id))
        .and_then(|i| seq.interface(i).map(|s| (i, s)))
        .ok_or_else(|| inconsistency(label))
}

/// Look up a live gap by id.
pub(crate) fn live_gap<'a>(
    seq: &'a SequentialModel,
    id: Option<GapId>,
    label: &str,
) -> Result<(usize, &'a Gap), ElementError> {
    id.and_then(|id| seq.gap_index(id))
        .and_then(|i| seq.gap(i).map(|g| (i, g)))
        .ok_or_else(|| inconsistency(label))
}

/// Resolve a stored interface index during restore.
pub(crate) fn restore_interface(
    seq: &SequentialModel,
    index: usize,
    label: &str,
) -> Result<InterfaceId, ElementError> {
    seq.interface(index)
        .map(Interface::id)
        .ok_or_else(|| ElementError::RestoreIndexOutOfRange {
            label: label.to_string(),
            index,
            count: seq.interface_count(),
        })
}

/// Resolve a stored gap index during restore.
pub(crate) fn restore_gap(
    seq: &SequentialModel,
    index: usize,
    label: &str,
) -> Result<GapId, ElementError> {
    seq.gap(index)
        .map(Gap::id)
        .ok_or_else(|| ElementError::RestoreIndexOutOfRange {
            label: label.to_string(),
            index,
            count: seq.gaps().len(),
        })
}

/// Transform cached for interface `index`, identity if out of range.
pub(crate) fn transform_at(tfrms: &[Transform], index: usize) -> Transform {
    tfrms.get(index).cloned().unwrap_or_default()
}

pub(crate) fn inconsistency(label: &str) -> ElementError {
    ElementError::StructuralInconsistency {
        label: label.to_string(),
    }
}

/// Close a polygon by repeating its first point.
pub(crate) fn close_polygon(mut points: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}
