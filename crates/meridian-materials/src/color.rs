//! Display colours for element outlines.
//!
//! Glass elements are tinted by Abbe number: low-V flints run towards red,
//! high-V crowns towards blue. The table is sampled with piecewise-linear
//! interpolation over its data range and clamps outside it.

use serde::{Deserialize, Serialize};

use crate::medium::glass_decode;

/// An 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RenderColor {
    /// Fallback for media without dispersion data.
    pub const NEUTRAL: RenderColor = RenderColor::rgb(255, 255, 255);
    /// Thin lenses and dummy planes.
    pub const LIGHT_GREY: RenderColor = RenderColor::rgb(192, 192, 192);
    /// Translucent grey used for mirror substrates.
    pub const MIRROR: RenderColor = RenderColor::rgba(158, 158, 158, 64);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for RenderColor {
    fn default() -> Self {
        RenderColor::NEUTRAL
    }
}

/// A colour table over a scalar data range.
#[derive(Debug, Clone)]
pub struct ColorTable {
    /// Values mapped to the first and last entries.
    data_range: (f64, f64),
    /// Evenly spaced colour stops.
    stops: Vec<[u8; 3]>,
}

impl ColorTable {
    /// Construct a table. Needs at least two stops and a non-empty range.
    pub fn new(data_range: (f64, f64), stops: Vec<[u8; 3]>) -> Option<Self> {
        if stops.len() < 2 || !(data_range.1 > data_range.0) {
            return None;
        }
        Some(Self { data_range, stops })
    }

    /// Red → blue table spanning Abbe numbers 10–100.
    pub fn red_blue() -> Self {
        Self {
            data_range: (10.0, 100.0),
            stops: vec![
                [178, 24, 43],
                [214, 96, 77],
                [244, 165, 130],
                [253, 219, 199],
                [209, 229, 240],
                [146, 197, 222],
                [67, 147, 195],
                [33, 102, 172],
            ],
        }
    }

    /// Interpolated colour at `value`.
    pub fn get_color(&self, value: f64) -> RenderColor {
        let (lo, hi) = self.data_range;
        let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
        let pos = t * (self.stops.len() - 1) as f64;
        let i = (pos.floor() as usize).min(self.stops.len() - 2);
        let frac = pos - i as f64;

        let lerp = |a: u8, b: u8| -> u8 {
            (a as f64 + (b as f64 - a as f64) * frac).round() as u8
        };
        let (c0, c1) = (self.stops[i], self.stops[i + 1]);
        RenderColor::rgb(lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2]))
    }
}

/// Display colour for a glass, from its glass code.
///
/// Falls back to [`RenderColor::NEUTRAL`] when there is no code or it
/// cannot be decoded.
pub fn glass_render_color(glass_code: Option<f64>) -> RenderColor {
    let Some(code) = glass_code else {
        return RenderColor::NEUTRAL;
    };
    match glass_decode(code) {
        Ok((_index, vnbr)) => ColorTable::red_blue().get_color(vnbr),
        Err(e) => {
            log::debug!("No render colour for glass code {}: {}", code, e);
            RenderColor::NEUTRAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_endpoints_and_clamping() {
        let table = ColorTable::red_blue();
        assert_eq!(table.get_color(10.0), RenderColor::rgb(178, 24, 43));
        assert_eq!(table.get_color(100.0), RenderColor::rgb(33, 102, 172));
        assert_eq!(table.get_color(-50.0), table.get_color(10.0));
        assert_eq!(table.get_color(250.0), table.get_color(100.0));
    }

    #[test]
    fn test_table_interpolates_between_stops() {
        let table = ColorTable::new((0.0, 1.0), vec![[0, 0, 0], [200, 100, 50]]).unwrap();
        assert_eq!(table.get_color(0.5), RenderColor::rgb(100, 50, 25));
    }

    #[test]
    fn test_table_rejects_degenerate_input() {
        assert!(ColorTable::new((1.0, 1.0), vec![[0, 0, 0], [1, 1, 1]]).is_none());
        assert!(ColorTable::new((0.0, 1.0), vec![[0, 0, 0]]).is_none());
    }

    #[test]
    fn test_crown_is_bluer_than_flint() {
        let crown = glass_render_color(Some(517.642));
        let flint = glass_render_color(Some(805.254));
        assert!(crown.b > flint.b);
        assert!(flint.r > crown.r);
    }

    #[test]
    fn test_missing_code_is_neutral() {
        assert_eq!(glass_render_color(None), RenderColor::NEUTRAL);
        assert_eq!(glass_render_color(Some(-1.0)), RenderColor::NEUTRAL);
    }
}
