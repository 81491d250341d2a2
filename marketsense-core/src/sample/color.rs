use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel `round(t·high + (1 − t)·low)`, with `t` clamped to `[0, 1]`.
    pub fn interpolate(low: Rgb, high: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |lo: u8, hi: u8| (t * hi as f64 + (1.0 - t) * lo as f64).round() as u8;
        Rgb::new(mix(low.r, high.r), mix(low.g, high.g), mix(low.b, high.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_anchors() {
        let low = Rgb::new(10, 200, 33);
        let high = Rgb::new(250, 0, 34);
        assert_eq!(Rgb::interpolate(low, high, 0.0), low);
        assert_eq!(Rgb::interpolate(low, high, 1.0), high);
    }

    #[test]
    fn midpoint_is_rounded_average() {
        let mid = Rgb::interpolate(Rgb::RED, Rgb::GREEN, 0.5);
        assert_eq!(mid, Rgb::new(128, 128, 0));
        let mid = Rgb::interpolate(Rgb::new(10, 200, 33), Rgb::new(250, 0, 34), 0.5);
        assert_eq!(mid, Rgb::new(130, 100, 34));
    }

    #[test]
    fn hex_display() {
        assert_eq!(Rgb::GREEN.to_string(), "#00ff00");
    }
}
