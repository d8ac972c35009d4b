/// 8-bit sRGB color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb` or `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let s = hex.trim().trim_start_matches('#');
        let expanded: String = match s.len() {
            3 => s.chars().flat_map(|c| [c, c]).collect(),
            6 => s.to_string(),
            _ => return None,
        };
        let v = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Self::new(
            ((v >> 16) & 0xff) as u8,
            ((v >> 8) & 0xff) as u8,
            (v & 0xff) as u8,
        ))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation towards `other`; `t` is clamped to `[0, 1]`.
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = clamp01(t);
        let lerp = |a: u8, b: u8| -> u8 {
            let a = a as f64;
            let b = b as f64;
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
        )
    }

    pub fn brighten(self, amount: f64) -> Rgb {
        self.mix(Rgb::WHITE, amount)
    }
}

fn clamp01(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Moves a hex color towards white by `amount` and returns lowercase `#rrggbb`.
///
/// Unparseable input is returned unchanged.
pub fn brighten_hex(hex: &str, amount: f64) -> String {
    match Rgb::parse_hex(hex) {
        Some(c) => c.brighten(amount).to_hex(),
        None => hex.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(Rgb::parse_hex("#fff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::parse_hex("3B82F6"), Some(Rgb::new(0x3b, 0x82, 0xf6)));
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn brighten_moves_towards_white() {
        assert_eq!(brighten_hex("#000000", 0.5), "#808080");
        assert_eq!(brighten_hex("#3B82F6", 0.2), "#629bf8");
        assert_eq!(brighten_hex("#3B82F6", 0.0), "#3b82f6");
        assert_eq!(brighten_hex("#3B82F6", 7.0), "#ffffff");
    }

    #[test]
    fn brighten_keeps_garbage_as_is() {
        assert_eq!(brighten_hex("teal", 0.3), "teal");
    }

    #[test]
    fn mix_is_clamped() {
        let a = Rgb::new(0, 0, 0);
        let b = Rgb::new(200, 100, 50);
        assert_eq!(a.mix(b, -1.0), a);
        assert_eq!(a.mix(b, 2.0), b);
        assert_eq!(a.mix(b, 0.5), Rgb::new(100, 50, 25));
    }
}
