//! Stroke and compositing state.

use cairo::{Antialias, LineCap, LineJoin, Operator};

use super::Machine;
use crate::operands::clamp_positive;

const LINE_CAPS: [LineCap; 3] = [LineCap::Butt, LineCap::Round, LineCap::Square];
const LINE_JOINS: [LineJoin; 3] = [LineJoin::Miter, LineJoin::Round, LineJoin::Bevel];

pub(crate) const ANTIALIAS_MODES: [Antialias; 7] = [
    Antialias::Default,
    Antialias::None,
    Antialias::Gray,
    Antialias::Subpixel,
    Antialias::Fast,
    Antialias::Good,
    Antialias::Best,
];

const OPERATORS: [Operator; 29] = [
    Operator::Clear,
    Operator::Source,
    Operator::Over,
    Operator::In,
    Operator::Out,
    Operator::Atop,
    Operator::Dest,
    Operator::DestOver,
    Operator::DestIn,
    Operator::DestOut,
    Operator::DestAtop,
    Operator::Xor,
    Operator::Add,
    Operator::Saturate,
    Operator::Multiply,
    Operator::Screen,
    Operator::Overlay,
    Operator::Darken,
    Operator::Lighten,
    Operator::ColorDodge,
    Operator::ColorBurn,
    Operator::HardLight,
    Operator::SoftLight,
    Operator::Difference,
    Operator::Exclusion,
    Operator::HslHue,
    Operator::HslSaturation,
    Operator::HslColor,
    Operator::HslLuminosity,
];

const DEFAULT_LINE_WIDTH: f64 = 2.0;
const DEFAULT_TOLERANCE: f64 = 0.1;
/// cairo rejects tolerances below this.
const MIN_TOLERANCE: f64 = 1e-4;

pub(crate) fn line_width(m: &mut Machine<'_>) {
    let width = clamp_positive(m.ops.unit(), DEFAULT_LINE_WIDTH);
    m.cr.set_line_width(width);
}

pub(crate) fn line_cap(m: &mut Machine<'_>) {
    let cap = LINE_CAPS[m.ops.selector(LINE_CAPS.len())];
    m.cr.set_line_cap(cap);
}

pub(crate) fn line_join(m: &mut Machine<'_>) {
    let join = LINE_JOINS[m.ops.selector(LINE_JOINS.len())];
    m.cr.set_line_join(join);
}

/// Passed through unclamped; cairo copes with any non-negative limit.
pub(crate) fn miter_limit(m: &mut Machine<'_>) {
    let limit = m.ops.extreme().abs();
    m.cr.set_miter_limit(limit);
}

pub(crate) fn dash(m: &mut Machine<'_>) {
    let (dashes, offset) = m.ops.dashes();
    m.cr.set_dash(&dashes, offset);
}

pub(crate) fn tolerance(m: &mut Machine<'_>) {
    let tolerance = clamp_positive(m.ops.unit(), DEFAULT_TOLERANCE).max(MIN_TOLERANCE);
    m.cr.set_tolerance(tolerance);
}

pub(crate) fn antialias(m: &mut Machine<'_>) {
    let mode = ANTIALIAS_MODES[m.ops.selector(ANTIALIAS_MODES.len())];
    m.cr.set_antialias(mode);
}

pub(crate) fn operator(m: &mut Machine<'_>) {
    let op = OPERATORS[m.ops.selector(OPERATORS.len())];
    m.cr.set_operator(op);
}
