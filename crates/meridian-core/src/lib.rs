//! # Meridian Core
//!
//! The structural model of an optical system. This crate keeps two views of
//! a lens in step:
//!
//! - the **sequential model** ([`sequential`]), an ordered list of
//!   interfaces and the gaps between them, which is what a ray tracer
//!   walks, and
//! - the **element model** ([`elements`]), a grouping of that list into
//!   lenses, mirrors, thin lenses, reference planes and air spaces, which is
//!   what a user edits and sees.
//!
//! ## Modules
//!
//! - [`sequential`] — Interfaces, gaps and structural edits.
//! - [`elements`] — Element entities and the grouping engine that builds,
//!   restores and refreshes them.
//! - [`doe`] — Phase transfer at diffractive and holographic surfaces.

pub mod doe;
pub mod elements;
pub mod sequential;

pub use doe::{DiffractionError, PhaseElement, PhaseResult, PhaseTransfer};
pub use elements::{Element, ElementError, ElementKind, ElementModel};
pub use sequential::{Gap, Interface, RefractMode, SequenceError, SequentialModel};
