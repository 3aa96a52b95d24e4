//! Painting and filling.

use cairo::FillRule;

use super::Machine;
use crate::operands::clamp_unit;

pub(crate) fn stroke(m: &mut Machine<'_>) {
    let _ = m.cr.stroke();
}

pub(crate) fn fill(m: &mut Machine<'_>) {
    let _ = m.cr.fill();
}

pub(crate) fn stroke_preserve(m: &mut Machine<'_>) {
    let _ = m.cr.stroke_preserve();
}

pub(crate) fn fill_preserve(m: &mut Machine<'_>) {
    let _ = m.cr.fill_preserve();
}

pub(crate) fn fill_rule(m: &mut Machine<'_>) {
    let rule = if m.ops.flag() {
        FillRule::EvenOdd
    } else {
        FillRule::Winding
    };
    m.cr.set_fill_rule(rule);
}

pub(crate) fn paint(m: &mut Machine<'_>) {
    if m.ops.flag() {
        let alpha = clamp_unit(m.ops.unit());
        let _ = m.cr.paint_with_alpha(alpha);
    } else {
        let _ = m.cr.paint();
    }
}
