//! Structured operand decoding.
//!
//! [`Operands`] owns the cursor and the jitter generator for a session and
//! builds the values handlers pass to cairo. Each builder applies the clamp
//! its target call needs; handlers that want to hand cairo a pathological
//! value use [`Operands::extreme`] or [`Operands::raw`] directly instead.

use cairo::{FontSlant, FontWeight, Glyph, Matrix, TextCluster};

use crate::cursor::ByteCursor;
use crate::extreme::{ExtremeMode, Jitter};
use crate::CANVAS_EXTENT;

/// Largest magnitude [`clamp_positive`] lets through.
pub const MAX_MAGNITUDE: f64 = 1e6;
/// Bounds applied by [`clamp_dimension`].
pub const MIN_DIMENSION: f64 = 1.0;
pub const MAX_DIMENSION: f64 = 20000.0;
/// Cap on string operand length; the length is `remaining % MAX_STRING_LEN`.
pub const MAX_STRING_LEN: usize = 64;
pub const MAX_DASHES: usize = 8;
pub const MAX_GLYPHS: usize = 10;
pub const MAX_CLUSTERS: usize = 4;
pub const MAX_COLOR_STOPS: usize = 3;

/// Font families known to resolve to a real face on common fontconfig setups.
pub const SAFE_FAMILIES: [&str; 5] = ["Sans", "Serif", "Monospace", "Georgia", "cairo:monospace"];

/// `default` when `v` is non-finite or not positive, otherwise `v` capped at 1e6.
pub fn clamp_positive(v: f64, default: f64) -> f64 {
    if !v.is_finite() || v <= 0.0 {
        default
    } else {
        v.min(MAX_MAGNITUDE)
    }
}

/// Canvas-scale default for non-finite values, otherwise clamped to `[1, 20000]`.
pub fn clamp_dimension(v: f64) -> f64 {
    if !v.is_finite() {
        return CANVAS_EXTENT as f64;
    }
    v.clamp(MIN_DIMENSION, MAX_DIMENSION)
}

/// Colour channels and alpha: NaN becomes 0, everything else lands in `[0, 1]`.
pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[inline]
pub fn finite_or(v: f64, default: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        default
    }
}

/// A gradient colour stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub rgba: [f64; 4],
}

/// Toy font selection drawn from [`SAFE_FAMILIES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToyFace {
    pub family: &'static str,
    pub slant: FontSlant,
    pub weight: FontWeight,
}

/// Operand decoder for one session.
#[derive(Debug, Clone)]
pub struct Operands<'a> {
    cursor: ByteCursor<'a>,
    jitter: Jitter,
}

impl<'a> Operands<'a> {
    pub fn new(data: &'a [u8], seed: u64) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            jitter: Jitter::new(seed),
        }
    }

    pub fn cursor(&self) -> &ByteCursor<'a> {
        &self.cursor
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    pub fn next_opcode(&mut self) -> Option<u8> {
        self.cursor.take_opcode()
    }

    #[inline]
    pub fn byte(&mut self) -> u8 {
        self.cursor.take_u8()
    }

    /// A byte reduced modulo `n`; `n` must be non-zero.
    #[inline]
    pub fn selector(&mut self, n: usize) -> usize {
        self.byte() as usize % n
    }

    #[inline]
    pub fn flag(&mut self) -> bool {
        self.byte() & 1 == 1
    }

    #[inline]
    pub fn u16(&mut self) -> u16 {
        self.cursor.take_u16()
    }

    #[inline]
    pub fn i32(&mut self) -> i32 {
        self.cursor.take_i32()
    }

    #[inline]
    pub fn u32(&mut self) -> u32 {
        self.cursor.take_u32()
    }

    pub fn bytes(&mut self, len: usize) -> &'a [u8] {
        self.cursor.take_slice(len)
    }

    /// Eight input bytes as a double, with no substitution.
    #[inline]
    pub fn raw(&mut self) -> f64 {
        self.cursor.take_f64()
    }

    /// A raw double routed through its [`ExtremeMode`].
    pub fn extreme(&mut self) -> f64 {
        let v = self.raw();
        ExtremeMode::of(v).apply(v, &mut self.jitter)
    }

    /// `|raw|`, for magnitudes the caller clamps itself.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.raw().abs()
    }

    pub fn point(&mut self) -> (f64, f64) {
        (self.extreme(), self.extreme())
    }

    /// A coordinate inside the canvas, with jitter.
    pub fn canvas_coord(&mut self) -> f64 {
        let v = self.raw();
        if v.is_finite() {
            ExtremeMode::Canvas.apply(v, &mut self.jitter)
        } else {
            CANVAS_EXTENT as f64 / 2.0
        }
    }

    /// A dimension from an extreme double, see [`clamp_dimension`].
    pub fn dimension(&mut self) -> f64 {
        clamp_dimension(self.extreme())
    }

    pub fn rgba(&mut self) -> [f64; 4] {
        [
            clamp_unit(self.unit()),
            clamp_unit(self.unit()),
            clamp_unit(self.unit()),
            clamp_unit(self.unit()),
        ]
    }

    /// Six extreme components. A component that is non-finite or larger than
    /// 1e6 in magnitude falls back to the identity value for its slot.
    pub fn matrix(&mut self) -> Matrix {
        const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let mut m = [0.0; 6];
        for (slot, fallback) in m.iter_mut().zip(IDENTITY) {
            let v = self.extreme();
            *slot = if v.is_finite() && v.abs() <= MAX_MAGNITUDE {
                v
            } else {
                fallback
            };
        }
        Matrix::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// A printable ASCII string of `remaining % 64` bytes.
    ///
    /// Zero-length strings are reachable whenever the remaining byte count is
    /// a multiple of 64.
    pub fn string(&mut self) -> String {
        let len = self.remaining() % MAX_STRING_LEN;
        self.bytes(len)
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    (b'a' + b % 26) as char
                }
            })
            .collect()
    }

    /// One to eight non-negative dash lengths and an offset.
    ///
    /// Lengths are finite and never all zero, so cairo accepts the pattern.
    pub fn dashes(&mut self) -> (Vec<f64>, f64) {
        let count = (self.raw() as i32).unsigned_abs() as usize % MAX_DASHES + 1;
        let mut dashes: Vec<f64> = (0..count)
            .map(|_| {
                let d = self.extreme().abs();
                if d.is_finite() {
                    d.min(MAX_MAGNITUDE)
                } else {
                    0.0
                }
            })
            .collect();
        if dashes.iter().all(|&d| d == 0.0) {
            dashes[0] = 1.0;
        }
        let offset = finite_or(self.extreme(), 0.0);
        (dashes, offset)
    }

    /// One to three colour stops with offsets in `[0, 1]`.
    pub fn color_stops(&mut self) -> Vec<ColorStop> {
        let count = self.selector(MAX_COLOR_STOPS) + 1;
        (0..count)
            .map(|_| ColorStop {
                offset: clamp_unit(self.unit()),
                rgba: self.rgba(),
            })
            .collect()
    }

    /// Up to ten glyphs positioned inside the canvas.
    pub fn glyphs(&mut self) -> Vec<Glyph> {
        let count = self.selector(MAX_GLYPHS + 1);
        (0..count)
            .map(|_| {
                let index = self.u16();
                let x = self.canvas_coord();
                let y = self.canvas_coord();
                Glyph::new(index.into(), x, y)
            })
            .collect()
    }

    /// Up to four clusters that exactly cover `text_len` bytes and
    /// `glyph_count` glyphs. Empty clusters are dropped.
    pub fn clusters(&mut self, text_len: usize, glyph_count: usize) -> Vec<TextCluster> {
        let count = self.selector(MAX_CLUSTERS) + 1;
        let mut bytes_left = text_len;
        let mut glyphs_left = glyph_count;
        let mut clusters = Vec::with_capacity(count);
        for i in 0..count {
            let (num_bytes, num_glyphs) = if i + 1 == count {
                (bytes_left, glyphs_left)
            } else {
                (
                    self.byte() as usize % (bytes_left + 1),
                    self.byte() as usize % (glyphs_left + 1),
                )
            };
            bytes_left -= num_bytes;
            glyphs_left -= num_glyphs;
            if num_bytes + num_glyphs > 0 {
                clusters.push(TextCluster::new(num_bytes as i32, num_glyphs as i32));
            }
        }
        clusters
    }

    pub fn font_face(&mut self) -> ToyFace {
        let family = SAFE_FAMILIES[self.selector(SAFE_FAMILIES.len())];
        let slant = match self.selector(3) {
            0 => FontSlant::Normal,
            1 => FontSlant::Italic,
            _ => FontSlant::Oblique,
        };
        let weight = if self.flag() {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
        ToyFace {
            family,
            slant,
            weight,
        }
    }
}
