//! # Meridian Materials
//!
//! Optical media for the Meridian lens model. Every gap in a sequential
//! model holds a shared [`Medium`](medium::Medium), which supplies a name,
//! an optional six-digit glass code, and a refractive index.
//!
//! ## Available media
//!
//! | Medium | Type | Dispersion |
//! |--------|------|------------|
//! | Air | [`medium::Air`] | none (n = 1) |
//! | Model glass | [`medium::ModelGlass`] | Cauchy fit through $n_d$, $V_d$ |
//!
//! ## Display colours
//!
//! [`color`] maps a glass's Abbe number onto a red → blue table so element
//! outlines can be tinted by dispersion. Media without a glass code are
//! drawn in a neutral colour.

pub mod color;
pub mod medium;

pub use color::{glass_render_color, ColorTable, RenderColor};
pub use medium::{
    air, glass_decode, glass_encode, is_air, same_medium, Air, Medium, MediumError, ModelGlass,
    LAMBDA_C, LAMBDA_D, LAMBDA_F,
};
