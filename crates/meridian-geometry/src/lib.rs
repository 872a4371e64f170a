//! # Meridian Geometry
//!
//! Geometry primitives for the Meridian lens model. This crate provides:
//!
//! - **Surface profiles** ([`profile`]) — Spherical and conic sag functions,
//!   curvature access, and the 2D outlines used to draw element shapes.
//! - **Transformations** ([`transform`]) — Rigid rotation + translation
//!   used for the global coordinates of every interface.

pub mod profile;
pub mod transform;

pub use profile::{Profile, ProfileError};
pub use transform::Transform;
