//! The sequential model: an ordered arena of interfaces and gaps.
//!
//! Interfaces are stored in ray-trace order, object first and image last.
//! Gap `i` sits between interface `i` and interface `i + 1`, so a model
//! with $N$ interfaces always holds $N - 1$ gaps.
//!
//! Positions shift whenever an interface is inserted or removed. Each
//! interface and gap therefore also carries a process-unique id, which is
//! what element entities hold on to between edits; their integer indices
//! are re-derived from the ids on every refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use meridian_geometry::{Profile, Transform};
use meridian_materials::{air, is_air, Medium};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::doe::PhaseTransfer;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity of an interface, stable for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId(u64);

/// Identity of a gap, stable for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GapId(u64);

/// Errors from structural edits of the sequential model.
#[derive(Debug, Error, PartialEq)]
pub enum SequenceError {
    #[error("Index {index} out of range (model has {count} interfaces)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Cannot insert at index {0}: the object surface must stay first and the image surface last")]
    InvalidInsertion(usize),

    #[error("Cannot remove interface {0}: the object and image surfaces are permanent")]
    ProtectedSurface(usize),

    #[error("A model with {interfaces} interfaces needs {} gaps, got {gaps}", .interfaces.saturating_sub(1))]
    GapCountMismatch { interfaces: usize, gaps: usize },
}

/// How a ray is redirected at an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RefractMode {
    #[default]
    Refract,
    Reflect,
    /// No redirection; a pure reference plane.
    None,
}

/// Physical model of an interface.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceKind {
    /// A real surface with a sag profile.
    Surface,
    /// An idealised zero-thickness lens of the given optical power.
    ThinLens { power: f64 },
}

/// A single optical surface.
#[derive(Debug)]
pub struct Interface {
    id: InterfaceId,
    pub label: String,
    pub profile: Profile,
    pub refract_mode: RefractMode,
    /// Outer clear-aperture semi-diameter.
    pub max_aperture: f64,
    pub kind: InterfaceKind,
    /// Grating or hologram recorded on the surface, if any.
    pub phase_element: Option<PhaseTransfer>,
}

impl Interface {
    /// A refracting surface with a unit semi-diameter.
    pub fn new(profile: Profile) -> Self {
        Self {
            id: InterfaceId(next_id()),
            label: String::new(),
            profile,
            refract_mode: RefractMode::Refract,
            max_aperture: 1.0,
            kind: InterfaceKind::Surface,
            phase_element: None,
        }
    }

    /// A flat reference plane that does not redirect rays.
    pub fn plane() -> Self {
        Self::new(Profile::default()).with_mode(RefractMode::None)
    }

    /// A thin lens of optical power `power`.
    pub fn thin_lens(power: f64) -> Self {
        Self {
            kind: InterfaceKind::ThinLens { power },
            ..Self::new(Profile::default())
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_mode(mut self, mode: RefractMode) -> Self {
        self.refract_mode = mode;
        self
    }

    pub fn with_aperture(mut self, semi_diameter: f64) -> Self {
        self.max_aperture = semi_diameter;
        self
    }

    pub fn with_phase_element(mut self, phase_element: PhaseTransfer) -> Self {
        self.phase_element = Some(phase_element);
        self
    }

    pub fn id(&self) -> InterfaceId {
        self.id
    }

    pub fn is_thin_lens(&self) -> bool {
        matches!(self.kind, InterfaceKind::ThinLens { .. })
    }

    /// Outer semi-diameter of the surface.
    pub fn surface_od(&self) -> f64 {
        self.max_aperture
    }

    /// Lower and upper meridional aperture heights.
    pub fn y_aperture_extent(&self) -> (f64, f64) {
        (-self.max_aperture, self.max_aperture)
    }

    pub fn profile_cv(&self) -> f64 {
        self.profile.cv()
    }

    pub fn set_profile_cv(&mut self, cv: f64) {
        self.profile.set_cv(cv);
    }

    /// Meridional outline of the surface, see [`Profile::full_profile`].
    pub fn full_profile(&self, extent: (f64, f64), flat: Option<f64>, dir: f64) -> Vec<[f64; 2]> {
        self.profile.full_profile(extent, flat, dir)
    }
}

/// The space between two consecutive interfaces.
#[derive(Debug)]
pub struct Gap {
    id: GapId,
    /// Signed axial thickness. Negative after an odd number of reflections.
    pub thi: f64,
    pub medium: Arc<dyn Medium>,
}

impl Gap {
    pub fn new(thi: f64, medium: Arc<dyn Medium>) -> Self {
        Self {
            id: GapId(next_id()),
            thi,
            medium,
        }
    }

    /// An air space of thickness `thi`.
    pub fn air(thi: f64) -> Self {
        Self::new(thi, air())
    }

    pub fn id(&self) -> GapId {
        self.id
    }

    pub fn is_air(&self) -> bool {
        is_air(self.medium.as_ref())
    }
}

/// Ordered interfaces and gaps of an optical system.
#[derive(Debug)]
pub struct SequentialModel {
    interfaces: Vec<Interface>,
    gaps: Vec<Gap>,
    stop_surface: Option<usize>,
}

impl Default for SequentialModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialModel {
    /// An empty system: object and image planes joined by one air gap.
    pub fn new() -> Self {
        Self {
            interfaces: vec![
                Interface::plane().with_label("Obj"),
                Interface::plane().with_label("Img"),
            ],
            gaps: vec![Gap::air(0.0)],
            stop_surface: None,
        }
    }

    /// Assemble a model from complete interface and gap lists.
    pub fn from_parts(
        interfaces: Vec<Interface>,
        gaps: Vec<Gap>,
        stop_surface: Option<usize>,
    ) -> Result<Self, SequenceError> {
        if interfaces.len() < 2 || gaps.len() + 1 != interfaces.len() {
            return Err(SequenceError::GapCountMismatch {
                interfaces: interfaces.len(),
                gaps: gaps.len(),
            });
        }
        if let Some(stop) = stop_surface {
            if stop >= interfaces.len() {
                return Err(SequenceError::IndexOutOfRange {
                    index: stop,
                    count: interfaces.len(),
                });
            }
        }
        Ok(Self {
            interfaces,
            gaps,
            stop_surface,
        })
    }

    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub fn interface(&self, index: usize) -> Option<&Interface> {
        self.interfaces.get(index)
    }

    pub fn interface_mut(&mut self, index: usize) -> Option<&mut Interface> {
        self.interfaces.get_mut(index)
    }

    pub fn gap(&self, index: usize) -> Option<&Gap> {
        self.gaps.get(index)
    }

    pub fn gap_mut(&mut self, index: usize) -> Option<&mut Gap> {
        self.gaps.get_mut(index)
    }

    /// Current position of an interface.
    pub fn interface_index(&self, id: InterfaceId) -> Option<usize> {
        self.interfaces.iter().position(|s| s.id == id)
    }

    /// Current position of a gap.
    pub fn gap_index(&self, id: GapId) -> Option<usize> {
        self.gaps.iter().position(|g| g.id == id)
    }

    pub fn stop_surface(&self) -> Option<usize> {
        self.stop_surface
    }

    pub fn set_stop_surface(&mut self, stop: Option<usize>) -> Result<(), SequenceError> {
        if let Some(index) = stop {
            self.check_index(index)?;
        }
        self.stop_surface = stop;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), SequenceError> {
        if index < self.interfaces.len() {
            Ok(())
        } else {
            Err(SequenceError::IndexOutOfRange {
                index,
                count: self.interfaces.len(),
            })
        }
    }

    /// Insert `interface` at `index`, followed by `gap`.
    ///
    /// The gap that used to follow interface `index - 1` now ends at the new
    /// interface; `gap` spans from the new interface to the one previously at
    /// `index`.
    pub fn insert_surface_and_gap(
        &mut self,
        index: usize,
        interface: Interface,
        gap: Gap,
    ) -> Result<(), SequenceError> {
        if index == 0 || index >= self.interfaces.len() {
            return Err(SequenceError::InvalidInsertion(index));
        }
        self.interfaces.insert(index, interface);
        self.gaps.insert(index, gap);
        if let Some(stop) = self.stop_surface.as_mut() {
            if *stop >= index {
                *stop += 1;
            }
        }
        Ok(())
    }

    /// Insert `interface` and the gap after it just before the image.
    pub fn add_surface(&mut self, interface: Interface, gap: Gap) -> Result<(), SequenceError> {
        let index = self.interfaces.len() - 1;
        self.insert_surface_and_gap(index, interface, gap)
    }

    /// Remove the interface at `index` together with the gap that follows it.
    pub fn remove_surface_and_gap(&mut self, index: usize) -> Result<(Interface, Gap), SequenceError> {
        self.check_index(index)?;
        if index == 0 || index == self.interfaces.len() - 1 {
            return Err(SequenceError::ProtectedSurface(index));
        }
        let interface = self.interfaces.remove(index);
        let gap = self.gaps.remove(index);
        self.stop_surface = match self.stop_surface {
            Some(stop) if stop == index => None,
            Some(stop) if stop > index => Some(stop - 1),
            other => other,
        };
        Ok((interface, gap))
    }

    /// Propagation sign in every gap: +1 initially, flipped by each
    /// reflecting interface.
    pub fn z_dirs(&self) -> Vec<f64> {
        let mut dir = 1.0;
        (0..self.gaps.len())
            .map(|i| {
                if self.interfaces[i].refract_mode == RefractMode::Reflect {
                    dir = -dir;
                }
                dir
            })
            .collect()
    }

    /// Propagation sign in the gap following interface `index`.
    pub fn z_dir(&self, index: usize) -> f64 {
        self.z_dirs().get(index).copied().unwrap_or(1.0)
    }

    /// Global transform of every interface, with interface `glo` at the origin.
    ///
    /// Interfaces are placed along the common axis by accumulating signed
    /// gap thicknesses outwards from `glo`. Accumulating relative to `glo`
    /// keeps a very distant object from swamping the lens positions.
    pub fn compute_global_coords(&self, glo: usize) -> Vec<Transform> {
        let n = self.interfaces.len();
        let glo = glo.min(n - 1);
        let mut z = vec![0.0; n];
        for i in glo + 1..n {
            z[i] = z[i - 1] + self.gaps[i - 1].thi;
        }
        for i in (0..glo).rev() {
            z[i] = z[i + 1] - self.gaps[i].thi;
        }
        z.into_iter().map(|zi| Transform::translation(0.0, 0.0, zi)).collect()
    }
}
