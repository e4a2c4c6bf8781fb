//! Color pipeline: base palette, emphasis variants and picture adjustment.
//!
//! The pipeline runs in three stages:
//!
//! | Stage      | Input                  | Output                          |
//! |------------|------------------------|---------------------------------|
//! | base       | file or built-in table | 64 RGB colors                   |
//! | emphasis   | base                   | 8 tables, one per `$2001` combo |
//! | adjustment | selected emphasis      | active 64-color table           |
//!
//! Adjustment never accumulates: every call recomputes the active table from
//! the emphasis-scaled base.

use std::path::Path;

use crate::Error;

/// Number of entries in the master palette.
pub const PALETTE_SIZE: usize = 64;

/// Attenuation of a dimmed channel. Several bits dimming the same channel
/// do not compound.
const EMPHASIS_FACTOR: f64 = 0.75;

/// Channel (0 red, 1 green, 2 blue) left at full strength by emphasis bits
/// 0, 1 and 2.
const EMPHASIS_KEEPS: [usize; 3] = [1, 2, 0];

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs the color as `0x00RRGGBB`.
    pub const fn to_rgb(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn from_rgb(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }
}

const BUILTIN: [Color; PALETTE_SIZE] = [
    Color::new(124, 124, 124),
    Color::new(0, 0, 252),
    Color::new(0, 0, 188),
    Color::new(68, 40, 188),
    Color::new(148, 0, 132),
    Color::new(168, 0, 32),
    Color::new(168, 16, 0),
    Color::new(136, 20, 0),
    Color::new(80, 48, 0),
    Color::new(0, 120, 0),
    Color::new(0, 104, 0),
    Color::new(0, 88, 0),
    Color::new(0, 64, 88),
    Color::new(0, 0, 0),
    Color::new(0, 0, 0),
    Color::new(0, 0, 0),
    Color::new(188, 188, 188),
    Color::new(0, 120, 248),
    Color::new(0, 88, 248),
    Color::new(104, 68, 252),
    Color::new(216, 0, 204),
    Color::new(228, 0, 88),
    Color::new(248, 56, 0),
    Color::new(228, 92, 16),
    Color::new(172, 124, 0),
    Color::new(0, 184, 0),
    Color::new(0, 168, 0),
    Color::new(0, 168, 68),
    Color::new(0, 136, 136),
    Color::new(0, 0, 0),
    Color::new(0, 0, 0),
    Color::new(0, 0, 0),
    Color::new(248, 248, 248),
    Color::new(60, 188, 252),
    Color::new(104, 136, 252),
    Color::new(152, 120, 248),
    Color::new(248, 120, 248),
    Color::new(248, 88, 152),
    Color::new(248, 120, 88),
    Color::new(252, 160, 68),
    Color::new(248, 184, 0),
    Color::new(184, 248, 24),
    Color::new(88, 216, 84),
    Color::new(88, 248, 152),
    Color::new(0, 232, 216),
    Color::new(120, 120, 120),
    Color::new(0, 0, 0),
    Color::new(0, 0, 0),
    Color::new(252, 252, 252),
    Color::new(164, 228, 252),
    Color::new(184, 184, 248),
    Color::new(216, 184, 248),
    Color::new(248, 184, 248),
    Color::new(248, 164, 192),
    Color::new(240, 208, 176),
    Color::new(252, 224, 168),
    Color::new(248, 216, 120),
    Color::new(216, 248, 120),
    Color::new(184, 248, 184),
    Color::new(184, 248, 216),
    Color::new(0, 252, 252),
    Color::new(216, 216, 216),
    Color::new(0, 0, 0),
    Color::new(0, 0, 0),
];

/// A 64-entry master palette.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Palette {
    colors: [Color; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Palette {
    /// The hardcoded fallback palette.
    pub const fn builtin() -> Self {
        Self { colors: BUILTIN }
    }

    pub fn colors(&self) -> &[Color; PALETTE_SIZE] {
        &self.colors
    }

    /// Parses 64 consecutive RGB triplets (the `.pal` format). Extra bytes
    /// are ignored.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < PALETTE_SIZE * 3 {
            return Err(Error::PaletteTooShort {
                actual: bytes.len() / 3,
            });
        }
        let mut colors = [Color::BLACK; PALETTE_SIZE];
        for (color, rgb) in colors.iter_mut().zip(bytes.chunks_exact(3)) {
            *color = Color::new(rgb[0], rgb[1], rgb[2]);
        }
        Ok(Self { colors })
    }

    /// Parses text with one `#RRGGBB` color per line. Lines that do not
    /// start with `#` are skipped; the first 64 colors are used.
    pub fn from_hex_text(text: &str) -> Result<Self, Error> {
        let mut colors = [Color::BLACK; PALETTE_SIZE];
        let mut count = 0;
        for (index, line) in text.lines().enumerate() {
            if count == PALETTE_SIZE {
                break;
            }
            let Some(hex) = line.trim().strip_prefix('#') else {
                continue;
            };
            let digits = hex.get(..6).filter(|d| d.is_ascii());
            let rgb = digits
                .and_then(|d| u32::from_str_radix(d, 16).ok())
                .ok_or(Error::MalformedPalette { line: index + 1 })?;
            colors[count] = Color::from_rgb(rgb);
            count += 1;
        }
        if count < PALETTE_SIZE {
            return Err(Error::PaletteTooShort { actual: count });
        }
        Ok(Self { colors })
    }

    /// Loads a palette file; `.pal` files are binary, anything else is text.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let binary = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pal"));
        if binary {
            Self::from_binary(&bytes)
        } else {
            Self::from_hex_text(&String::from_utf8_lossy(&bytes))
        }
    }
}

/// Picture adjustment deltas, kept until the next [`PaletteTable::adjust`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorAdjust {
    pub hue: i32,
    pub saturation: i32,
    pub lightness: i32,
    pub contrast: i32,
}

impl ColorAdjust {
    fn is_identity(self) -> bool {
        self == Self::default()
    }
}

/// The color pipeline owned by the PPU.
#[derive(Debug, Clone)]
pub struct PaletteTable {
    base: Palette,
    emphasis_tables: [[Color; PALETTE_SIZE]; 8],
    current: [Color; PALETTE_SIZE],
    emphasis: u8,
    adjustment: ColorAdjust,
}

impl Default for PaletteTable {
    fn default() -> Self {
        Self::new(Palette::builtin())
    }
}

impl PaletteTable {
    pub fn new(base: Palette) -> Self {
        let mut table = Self {
            base,
            emphasis_tables: [[Color::BLACK; PALETTE_SIZE]; 8],
            current: BUILTIN,
            emphasis: 0,
            adjustment: ColorAdjust::default(),
        };
        table.rebuild();
        table
    }

    /// Loads a palette file, falling back to the built-in table on any
    /// failure. Returns `false` when the fallback was used.
    pub fn load_palette(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match Palette::from_file(path) {
            Ok(palette) => {
                tracing::debug!(path = %path.display(), "loaded palette");
                self.set_base(palette);
                true
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "palette unavailable, using built-in colors");
                self.set_base(Palette::builtin());
                false
            }
        }
    }

    /// Replaces the base palette and recomputes every derived table.
    pub fn set_base(&mut self, base: Palette) {
        self.base = base;
        self.rebuild();
    }

    pub fn base(&self) -> &Palette {
        &self.base
    }

    /// Selects the emphasis table (green bit 0, blue bit 1, red bit 2) and
    /// reapplies the current adjustment.
    pub fn set_emphasis(&mut self, bits: u8) {
        let bits = bits & 0b111;
        if bits != self.emphasis {
            self.emphasis = bits;
            self.apply_adjustment();
        }
    }

    pub fn emphasis(&self) -> u8 {
        self.emphasis
    }

    /// Recomputes the active table from the emphasis-scaled base with the
    /// given deltas. Hue wraps modulo 256; contrast is scaled by 4.
    pub fn adjust(&mut self, hue: i32, saturation: i32, lightness: i32, contrast: i32) {
        self.adjustment = ColorAdjust {
            hue,
            saturation,
            lightness,
            contrast,
        };
        self.apply_adjustment();
    }

    pub fn adjustment(&self) -> ColorAdjust {
        self.adjustment
    }

    /// Active color for a 6-bit palette index, packed as `0x00RRGGBB`.
    pub fn entry(&self, index: u8) -> u32 {
        self.current[usize::from(index) & (PALETTE_SIZE - 1)].to_rgb()
    }

    /// Emphasis-scaled base color before adjustment.
    pub fn emphasized(&self, emphasis: u8, index: u8) -> Color {
        self.emphasis_tables[usize::from(emphasis & 0b111)][usize::from(index) & (PALETTE_SIZE - 1)]
    }

    /// Drops emphasis and adjustment.
    pub fn reset(&mut self) {
        self.emphasis = 0;
        self.adjustment = ColorAdjust::default();
        self.apply_adjustment();
    }

    fn rebuild(&mut self) {
        for (bits, table) in self.emphasis_tables.iter_mut().enumerate() {
            let factor = |channel: usize| {
                let dimmed = (0..3).any(|bit| bits & (1 << bit) != 0 && EMPHASIS_KEEPS[bit] != channel);
                if dimmed { EMPHASIS_FACTOR } else { 1.0 }
            };
            for (out, color) in table.iter_mut().zip(self.base.colors.iter()) {
                *out = Color::new(
                    scale(color.r, factor(0)),
                    scale(color.g, factor(1)),
                    scale(color.b, factor(2)),
                );
            }
        }
        self.apply_adjustment();
    }

    fn apply_adjustment(&mut self) {
        let source = &self.emphasis_tables[usize::from(self.emphasis)];
        let adjust = self.adjustment;
        if adjust.is_identity() {
            self.current = *source;
            return;
        }
        for (out, &color) in self.current.iter_mut().zip(source.iter()) {
            *out = adjust_color(color, adjust);
        }
    }
}

fn scale(channel: u8, factor: f64) -> u8 {
    (f64::from(channel) * factor) as u8
}

fn adjust_color(color: Color, adjust: ColorAdjust) -> Color {
    let (h, s, l) = rgb_to_hsl(color);

    let h = (h * 256.0 + f64::from(adjust.hue)).rem_euclid(256.0) / 256.0;
    let s = (s * 255.0 * (1.0 + f64::from(adjust.saturation) / 256.0)).clamp(0.0, 255.0) / 255.0;
    let (r, g, b) = hsl_to_rgb(h, s, l);

    let gain = 1.0 + f64::from(adjust.contrast * 4) / 256.0;
    let lightness = f64::from(adjust.lightness);
    let channel = |c: f64| (128.0 + lightness + (c * 255.0 - 128.0) * gain).round().clamp(0.0, 255.0) as u8;
    Color::new(channel(r), channel(g), channel(b))
}

fn rgb_to_hsl(color: Color) -> (f64, f64, f64) {
    let r = f64::from(color.r) / 255.0;
    let g = f64::from(color.g) / 255.0;
    let b = f64::from(color.b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if max == min {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
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
