use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::InvalidColor;

/// An opaque RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const NAMED_COLORS: [(&str, Color); 12] = [
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("orange", Color::rgb(255, 165, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("brown", Color::rgb(165, 42, 42)),
    ("cyan", Color::rgb(0, 255, 255)),
];

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from a hue in degrees and a saturation and lightness in
    /// percent.
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let l = (lightness / 100.0).clamp(0.0, 1.0);
        if s == 0.0 {
            let v = to_channel(l);
            return Self::rgb(v, v, v);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::rgb(
            to_channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            to_channel(hue_to_rgb(p, q, h)),
            to_channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        )
    }

    /// Mixes in `other`, `weight` being how much of `other` the result has.
    pub fn mix(self, other: Color, weight: f64) -> Self {
        let w = weight.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| (f64::from(b) * w + f64::from(a) * (1.0 - w)).round() as u8;
        Self::rgb(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }

    /// Raises the whiteness (in the hue-whiteness-blackness model) by
    /// `ratio` of itself.
    pub fn whiten(self, ratio: f64) -> Self {
        let (hue, whiteness, blackness) = self.hwb();
        let whiteness = (whiteness + whiteness * ratio).clamp(0.0, 1.0);
        from_hwb(hue, whiteness, blackness)
    }

    /// The color as a single `0xRRGGBB` number.
    pub fn rgb_number(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    pub fn from_rgb_number(n: u32) -> Self {
        Self::rgb((n >> 16) as u8, (n >> 8) as u8, n as u8)
    }

    /// Relative luminance in `[0, 1]`, for picking a readable text color.
    pub fn luminosity(self) -> f64 {
        (0.2126 * f64::from(self.r) + 0.7152 * f64::from(self.g) + 0.0722 * f64::from(self.b))
            / 255.0
    }

    pub fn is_dark(self) -> bool {
        self.luminosity() < 0.5
    }

    fn hwb(self) -> (f64, f64, f64) {
        let (r, g, b) = (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        );
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        (hue, min, 1.0 - max)
    }
}

fn from_hwb(hue: f64, whiteness: f64, blackness: f64) -> Color {
    if whiteness + blackness >= 1.0 {
        let gray = to_channel(whiteness / (whiteness + blackness));
        return Color::rgb(gray, gray, gray);
    }
    let pure = Color::from_hsl(hue, 100.0, 50.0);
    let scale = 1.0 - whiteness - blackness;
    let channel = |c: u8| to_channel(f64::from(c) / 255.0 * scale + whiteness);
    Color::rgb(channel(pure.r), channel(pure.g), channel(pure.b))
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl FromStr for Color {
    type Err = InvalidColor;

    /// Parses `#rgb`, `#rrggbb` or one of a few color names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidColor(String::from(s));
        let trimmed = s.trim();
        if let Some((_, color)) = NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        {
            return Ok(*color);
        }
        let hex = trimmed.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        match hex.len() {
            3 => {
                let n = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
                let expand = |nibble: u32| (nibble * 17) as u8;
                Ok(Color::rgb(
                    expand((n >> 8) & 0xF),
                    expand((n >> 4) & 0xF),
                    expand(n & 0xF),
                ))
            }
            6 => {
                let n = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
                Ok(Color::from_rgb_number(n))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = InvalidColor;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
