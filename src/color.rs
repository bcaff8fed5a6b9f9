//! Color model and perceptual downgrading for terminals with reduced palettes.

use crate::error::{Result, WmError};

/// A cell or chrome color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Color {
    /// True color RGB.
    Rgb {
        /// Red component.
        r: u8,
        /// Green component.
        g: u8,
        /// Blue component.
        b: u8,
    },
    /// 256-color palette index.
    Indexed(u8),
    /// One of the 16 standard ANSI colors.
    Named(NamedColor),
    /// Terminal's default color.
    Reset,
}

/// The 16 standard ANSI colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NamedColor {
    /// Black (0).
    Black,
    /// Red (1).
    Red,
    /// Green (2).
    Green,
    /// Yellow (3).
    Yellow,
    /// Blue (4).
    Blue,
    /// Magenta (5).
    Magenta,
    /// Cyan (6).
    Cyan,
    /// White (7).
    White,
    /// Bright black / dark gray (8).
    BrightBlack,
    /// Bright red (9).
    BrightRed,
    /// Bright green (10).
    BrightGreen,
    /// Bright yellow (11).
    BrightYellow,
    /// Bright blue (12).
    BrightBlue,
    /// Bright magenta (13).
    BrightMagenta,
    /// Bright cyan (14).
    BrightCyan,
    /// Bright white (15).
    BrightWhite,
}

/// The range of color fidelity a terminal can display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSupport {
    /// 24-bit RGB.
    TrueColor,
    /// 256-color indexed palette.
    Extended256,
    /// 16 named ANSI colors.
    Basic16,
    /// No color at all (also forced by `NO_COLOR`).
    NoColor,
}

impl Color {
    /// Parse `"#rrggbb"` or `"#rgb"`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        match hex.len() {
            6 => {
                let r = parse_hex_byte(&hex[0..2])?;
                let g = parse_hex_byte(&hex[2..4])?;
                let b = parse_hex_byte(&hex[4..6])?;
                Ok(Self::Rgb { r, g, b })
            }
            3 => {
                let r = parse_hex_nibble(&hex[0..1])?;
                let g = parse_hex_nibble(&hex[1..2])?;
                let b = parse_hex_nibble(&hex[2..3])?;
                Ok(Self::Rgb {
                    r: r * 17,
                    g: g * 17,
                    b: b * 17,
                })
            }
            n => Err(WmError::InvalidBounds(format!(
                "invalid hex color length: expected 3 or 6, got {n}"
            ))),
        }
    }

    /// Downgrade this color to fit `support`, respecting `NO_COLOR`.
    pub fn downgrade(self, support: ColorSupport) -> Self {
        if std::env::var_os("NO_COLOR").is_some() {
            return Color::Reset;
        }
        match (self, support) {
            (c, ColorSupport::TrueColor) => c,
            (Color::Rgb { r, g, b }, ColorSupport::Extended256) => Color::Indexed(rgb_to_256(r, g, b)),
            (Color::Rgb { r, g, b }, ColorSupport::Basic16) => Color::Named(rgb_to_16(r, g, b)),
            (c, ColorSupport::NoColor) => {
                let _ = c;
                Color::Reset
            }
            (other, _) => other,
        }
    }
}

fn parse_hex_byte(s: &str) -> Result<u8> {
    u8::from_str_radix(s, 16).map_err(|e| WmError::InvalidBounds(format!("invalid hex color: {e}")))
}

fn parse_hex_nibble(s: &str) -> Result<u8> {
    parse_hex_byte(s)
}

/// A perceptually-nearest [`u8`; 3] -> LAB conversion, shared by the 256-color
/// and 16-color downgrade paths below.
fn rgb_to_lab(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let to_linear = |c: u8| {
        let c = f64::from(c) / 255.0;
        if c > 0.04045 {
            ((c + 0.055) / 1.055).powf(2.4)
        } else {
            c / 12.92
        }
    };
    let (r, g, b) = (to_linear(r), to_linear(g), to_linear(b));

    // sRGB -> XYZ (D65).
    let x = r * 0.4124564 + g * 0.3575761 + b * 0.1804375;
    let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
    let z = r * 0.0193339 + g * 0.1191920 + b * 0.9503041;

    let (xn, yn, zn) = (0.95047, 1.0, 1.08883);
    let f = |t: f64| {
        if t > 0.008856 {
            t.powf(1.0 / 3.0)
        } else {
            7.787 * t + 16.0 / 116.0
        }
    };
    let (fx, fy, fz) = (f(x / xn), f(y / yn), f(z / zn));

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let b_lab = 200.0 * (fy - fz);
    (l, a, b_lab)
}

fn lab_distance(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    let dl = a.0 - b.0;
    let da = a.1 - b.1;
    let db = a.2 - b.2;
    (dl * dl + da * da + db * db).sqrt()
}

/// The 16 basic ANSI colors as RGB, in palette-index order.
const BASIC16_RGB: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (128, 0, 0),
    (0, 128, 0),
    (128, 128, 0),
    (0, 0, 128),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

const NAMED_ORDER: [NamedColor; 16] = [
    NamedColor::Black,
    NamedColor::Red,
    NamedColor::Green,
    NamedColor::Yellow,
    NamedColor::Blue,
    NamedColor::Magenta,
    NamedColor::Cyan,
    NamedColor::White,
    NamedColor::BrightBlack,
    NamedColor::BrightRed,
    NamedColor::BrightGreen,
    NamedColor::BrightYellow,
    NamedColor::BrightBlue,
    NamedColor::BrightMagenta,
    NamedColor::BrightCyan,
    NamedColor::BrightWhite,
];

/// Map an RGB triple to the nearest xterm 256-color palette index, by
/// perceptual (CIELAB) distance, checking the grayscale ramp, the 6x6x6
/// color cube, and the basic 16 colors.
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    let target = rgb_to_lab(r, g, b);
    let mut best_idx: u8 = 0;
    let mut best_dist = f64::MAX;

    // Basic 16 (indices 0-15).
    for (i, &(cr, cg, cb)) in BASIC16_RGB.iter().enumerate() {
        let d = lab_distance(target, rgb_to_lab(cr, cg, cb));
        if d < best_dist {
            best_dist = d;
            best_idx = i as u8;
        }
    }

    // 6x6x6 cube (indices 16-231).
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    for ri in 0..6u8 {
        for gi in 0..6u8 {
            for bi in 0..6u8 {
                let (cr, cg, cb) = (LEVELS[ri as usize], LEVELS[gi as usize], LEVELS[bi as usize]);
                let d = lab_distance(target, rgb_to_lab(cr, cg, cb));
                if d < best_dist {
                    best_dist = d;
                    best_idx = 16 + 36 * ri + 6 * gi + bi;
                }
            }
        }
    }

    // Grayscale ramp (indices 232-255).
    for i in 0..24u8 {
        let v = 8 + i * 10;
        let d = lab_distance(target, rgb_to_lab(v, v, v));
        if d < best_dist {
            best_dist = d;
            best_idx = 232 + i;
        }
    }

    best_idx
}

/// Map an RGB triple to the nearest of the 16 named ANSI colors by
/// perceptual (CIELAB) distance.
pub fn rgb_to_16(r: u8, g: u8, b: u8) -> NamedColor {
    let target = rgb_to_lab(r, g, b);
    let mut best = NamedColor::White;
    let mut best_dist = f64::MAX;
    for (i, &(cr, cg, cb)) in BASIC16_RGB.iter().enumerate() {
        let d = lab_distance(target, rgb_to_lab(cr, cg, cb));
        if d < best_dist {
            best_dist = d;
            best = NAMED_ORDER[i];
        }
    }
    best
}

impl From<Color> for crossterm::style::Color {
    fn from(color: Color) -> Self {
        match color {
            Color::Rgb { r, g, b } => crossterm::style::Color::Rgb { r, g, b },
            Color::Indexed(i) => crossterm::style::Color::AnsiValue(i),
            Color::Named(n) => match n {
                NamedColor::Black => crossterm::style::Color::Black,
                NamedColor::Red => crossterm::style::Color::DarkRed,
                NamedColor::Green => crossterm::style::Color::DarkGreen,
                NamedColor::Yellow => crossterm::style::Color::DarkYellow,
                NamedColor::Blue => crossterm::style::Color::DarkBlue,
                NamedColor::Magenta => crossterm::style::Color::DarkMagenta,
                NamedColor::Cyan => crossterm::style::Color::DarkCyan,
                NamedColor::White => crossterm::style::Color::Grey,
                NamedColor::BrightBlack => crossterm::style::Color::DarkGrey,
                NamedColor::BrightRed => crossterm::style::Color::Red,
                NamedColor::BrightGreen => crossterm::style::Color::Green,
                NamedColor::BrightYellow => crossterm::style::Color::Yellow,
                NamedColor::BrightBlue => crossterm::style::Color::Blue,
                NamedColor::BrightMagenta => crossterm::style::Color::Magenta,
                NamedColor::BrightCyan => crossterm::style::Color::Cyan,
                NamedColor::BrightWhite => crossterm::style::Color::White,
            },
            Color::Reset => crossterm::style::Color::Reset,
        }
    }
}
