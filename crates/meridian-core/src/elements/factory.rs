//! Constructors for new elements and the model objects they wrap.
//!
//! Each factory returns the interfaces (and gap) to insert into a
//! [`SequentialModel`](crate::sequential::SequentialModel) together with a
//! detached element bound to them by id. Once the parts are inserted and the
//! element pushed onto the [`ElementModel`](super::ElementModel), the next
//! `update_model` fills in its indices.

use std::sync::Arc;

use meridian_geometry::Profile;
use meridian_materials::{Medium, ModelGlass, LAMBDA_D};

use super::{DummyInterface, Element, Lens, Mirror, ThinElement};
use crate::sequential::{Gap, Interface, RefractMode};

/// Mirror surface description: curvature `c` or radius `r`, conic constant
/// `cc` or eccentricity-style `ec` (`cc = ec - 1`). `r` and `ec` win when
/// set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MirrorShape {
    pub c: f64,
    pub r: Option<f64>,
    pub cc: f64,
    pub ec: Option<f64>,
}

impl MirrorShape {
    fn profile(&self) -> Profile {
        let cv = match self.r {
            Some(r) if r != 0.0 => 1.0 / r,
            _ => self.c,
        };
        let k = match self.ec {
            Some(ec) if ec != 0.0 => ec - 1.0,
            _ => self.cc,
        };
        Profile::conic(cv, k)
    }
}

pub fn create_mirror(shape: &MirrorShape, sd: f64) -> (Interface, Element) {
    let m = Interface::new(shape.profile())
        .with_mode(RefractMode::Reflect)
        .with_aperture(sd);
    let me = Mirror::detached(&m, sd, None, -1.0);
    (m, me.into())
}

/// A singlet of thin-lens `power` and shape factor `bending`.
///
/// The face curvatures follow the thin-lens relations
/// $c_1 - c_2 = \phi / (n - 1)$ and $B = (c_1 + c_2)/(c_1 - c_2)$, with
/// $n$ taken at the d line. Without a medium the lens is made of a generic
/// $n = 1.5$ glass.
pub fn create_lens(
    power: f64,
    bending: f64,
    th: f64,
    sd: f64,
    medium: Option<Arc<dyn Medium>>,
) -> ((Interface, Interface, Gap), Element) {
    let medium = medium.unwrap_or_else(|| Arc::new(ModelGlass::new("Glass", 1.5, 64.0)));
    let n = medium
        .refractive_index(LAMBDA_D)
        .ok()
        .filter(|n| *n > 1.0)
        .unwrap_or(1.5);

    let delta_cv = power / (n - 1.0);
    let cv1 = 0.5 * (bending + 1.0) * delta_cv;
    let cv2 = 0.5 * (bending - 1.0) * delta_cv;

    let s1 = Interface::new(Profile::spherical(cv1)).with_aperture(sd);
    let s2 = Interface::new(Profile::spherical(cv2)).with_aperture(sd);
    let g = Gap::new(th, medium);
    let le = Lens::detached(&s1, &s2, &g, sd);
    ((s1, s2, g), le.into())
}

pub fn create_thinlens(power: f64, sd: f64) -> (Interface, Element) {
    let tl = Interface::thin_lens(power).with_aperture(sd);
    let tle = ThinElement::detached(&tl, sd);
    (tl, tle.into())
}

pub fn create_dummy_plane(sd: f64) -> (Interface, Element) {
    let s = Interface::plane().with_aperture(sd);
    let se = DummyInterface::detached(&s, sd);
    (s, se.into())
}
