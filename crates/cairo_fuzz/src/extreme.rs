//! Pathological floating-point values.
//!
//! A decoded double is routed through one of seven modes chosen by
//! `|v mod 7|`. Three modes replace it with NaN or an infinity and two push
//! it to overflow- or subnormal-adjacent magnitudes, so roughly three in
//! seven operands hit the library's numeric edge cases.

use crate::CANVAS_EXTENT;

/// Scale factor used by the huge and tiny modes.
pub const EXTREME_SCALE: f64 = 1e300;

/// How a raw double is transformed before it reaches a library call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremeMode {
    Nan,
    PosInfinity,
    NegInfinity,
    Huge,
    Tiny,
    Raw,
    Canvas,
}

impl ExtremeMode {
    /// Selects the mode for `v`. NaN and infinite inputs select `Nan`.
    pub fn of(v: f64) -> Self {
        // saturating cast: NaN maps to 0
        match (v % 7.0).abs() as u32 {
            0 => Self::Nan,
            1 => Self::PosInfinity,
            2 => Self::NegInfinity,
            3 => Self::Huge,
            4 => Self::Tiny,
            5 => Self::Raw,
            _ => Self::Canvas,
        }
    }

    pub fn apply(self, v: f64, jitter: &mut Jitter) -> f64 {
        match self {
            Self::Nan => f64::NAN,
            Self::PosInfinity => f64::INFINITY,
            Self::NegInfinity => f64::NEG_INFINITY,
            Self::Huge => v * EXTREME_SCALE,
            Self::Tiny => v / EXTREME_SCALE,
            Self::Raw => v,
            Self::Canvas => v.abs() % CANVAS_EXTENT as f64 + jitter.next_unit(),
        }
    }
}

/// Seeded SplitMix64 generator for in-canvas jitter.
///
/// Owned by a session, never global: a (seed, input) pair replays the exact
/// same call sequence.
#[derive(Debug, Clone, Copy)]
pub struct Jitter {
    state: u64,
}

impl Jitter {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)` with 53 bits of precision.
    pub fn next_unit(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }
}
