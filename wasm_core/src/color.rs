//! HEX / RGB / HSL / CMYK conversions for the color converter tool.
//!
//! All channel values are integers the way the UI displays them: RGB in
//! `0..=255`, hue in degrees, saturation/lightness/CMYK in percent.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hsl {
    pub h: u16,
    pub s: u8,
    pub l: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cmyk {
    pub c: u8,
    pub m: u8,
    pub y: u8,
    pub k: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ColorFormats {
    pub hex: String,
    pub rgb: Rgb,
    pub hsl: Hsl,
    pub cmyk: Cmyk,
}

/// Parses `#rrggbb`, `rrggbb` or the short `#rgb` form.
///
/// # Example
/// ```
/// use wcag_core::color::{hex_to_rgb, Rgb};
/// assert_eq!(hex_to_rgb("#D97706")?, Rgb { r: 217, g: 119, b: 6 });
/// assert_eq!(hex_to_rgb("fff")?, Rgb { r: 255, g: 255, b: 255 });
/// # Ok::<(), String>(())
/// ```
pub fn hex_to_rgb(input: &str) -> Result<Rgb, String> {
    let clean = input.trim().trim_start_matches('#');
    let expanded: String = match clean.len() {
        3 => clean.chars().flat_map(|c| [c, c]).collect(),
        6 => clean.to_string(),
        _ => return Err(format!("invalid hex color: {input}")),
    };
    let bytes = hex::decode(&expanded).map_err(|_| format!("invalid hex color: {input}"))?;
    Ok(Rgb {
        r: bytes[0],
        g: bytes[1],
        b: bytes[2],
    })
}

pub fn rgb_to_hex(rgb: Rgb) -> String {
    format!("#{}", hex::encode([rgb.r, rgb.g, rgb.b]))
}

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let (mut h, mut s) = (0.0, 0.0);
    if max != min {
        let d = max - min;
        s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        h = if max == r {
            ((g - b) / d + if g < b { 6.0 } else { 0.0 }) / 6.0
        } else if max == g {
            ((b - r) / d + 2.0) / 6.0
        } else {
            ((r - g) / d + 4.0) / 6.0
        };
    }
    Hsl {
        h: round_half_up(h * 360.0) as u16 % 360,
        s: round_half_up(s * 100.0) as u8,
        l: round_half_up(l * 100.0) as u8,
    }
}

pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let h = f64::from(hsl.h % 360) / 360.0;
    let s = f64::from(hsl.s.min(100)) / 100.0;
    let l = f64::from(hsl.l.min(100)) / 100.0;
    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    };
    Rgb {
        r: to_byte(r),
        g: to_byte(g),
        b: to_byte(b),
    }
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Pure black maps to `k = 100` with zero inks.
pub fn rgb_to_cmyk(rgb: Rgb) -> Cmyk {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;
    let k = 1.0 - r.max(g).max(b);
    if k >= 1.0 {
        return Cmyk {
            c: 0,
            m: 0,
            y: 0,
            k: 100,
        };
    }
    let ink = |channel: f64| round_half_up((1.0 - channel - k) / (1.0 - k) * 100.0) as u8;
    Cmyk {
        c: ink(r),
        m: ink(g),
        y: ink(b),
        k: round_half_up(k * 100.0) as u8,
    }
}

pub fn cmyk_to_rgb(cmyk: Cmyk) -> Rgb {
    let k = f64::from(cmyk.k.min(100)) / 100.0;
    let channel = |ink: u8| to_byte((1.0 - f64::from(ink.min(100)) / 100.0) * (1.0 - k));
    Rgb {
        r: channel(cmyk.c),
        g: channel(cmyk.m),
        b: channel(cmyk.y),
    }
}

/// Detects the notation of `input` (hex, `rgb(r, g, b)`, `hsl(h, s%, l%)`) and
/// returns every representation of the color.
///
/// # Example
/// ```
/// use wcag_core::color::convert_color;
/// let formats = convert_color("rgb(255, 0, 0)")?;
/// assert_eq!(formats.hex, "#ff0000");
/// assert_eq!(formats.hsl.h, 0);
/// assert_eq!(formats.cmyk.m, 100);
/// # Ok::<(), String>(())
/// ```
pub fn convert_color(input: &str) -> Result<ColorFormats, String> {
    let trimmed = input.trim();
    let rgb = if regex_hex().is_match(trimmed) {
        hex_to_rgb(trimmed)?
    } else if let Some(caps) = regex_rgb().captures(trimmed) {
        Rgb {
            r: parse_channel(&caps[1], 255)? as u8,
            g: parse_channel(&caps[2], 255)? as u8,
            b: parse_channel(&caps[3], 255)? as u8,
        }
    } else if let Some(caps) = regex_hsl().captures(trimmed) {
        hsl_to_rgb(Hsl {
            h: parse_channel(&caps[1], 360)? as u16,
            s: parse_channel(&caps[2], 100)? as u8,
            l: parse_channel(&caps[3], 100)? as u8,
        })
    } else {
        return Err(format!("unrecognized color: {input}"));
    };
    Ok(ColorFormats {
        hex: rgb_to_hex(rgb),
        rgb,
        hsl: rgb_to_hsl(rgb),
        cmyk: rgb_to_cmyk(rgb),
    })
}

fn parse_channel(text: &str, max: u32) -> Result<u32, String> {
    let value: u32 = text.parse().map_err(|_| format!("invalid channel: {text}"))?;
    if value > max {
        return Err(format!("channel {value} exceeds {max}"));
    }
    Ok(value)
}

// Matches JavaScript's Math.round for the non-negative values used here.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn to_byte(value: f64) -> u8 {
    round_half_up(value * 255.0).clamp(0.0, 255.0) as u8
}

fn regex_hex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#?(?:[0-9A-Fa-f]{6}|[0-9A-Fa-f]{3})$").unwrap())
}

fn regex_rgb() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^rgb\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*\)$").unwrap())
}

fn regex_hsl() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^hsl\(\s*(\d+)\s*,\s*(\d+)%?\s*,\s*(\d+)%?\s*\)$").unwrap())
}
