//! Current transformation matrix and the save/restore stack.

use super::{invertible_or_identity, Frame, Machine};
use crate::operands::finite_or;

/// Scale, rotate or translate by extreme amounts.
///
/// Non-finite values are replaced, but tiny scale factors are not: a scale
/// whose determinant underflows leaves the context in an error state.
pub(crate) fn transform_step(m: &mut Machine<'_>) {
    match m.ops.selector(3) {
        0 => {
            let sx = finite_or(m.ops.extreme(), 1.0);
            let sy = finite_or(m.ops.extreme(), 1.0);
            m.cr.scale(sx, sy);
        }
        1 => {
            let angle = finite_or(m.ops.extreme(), 0.0);
            m.cr.rotate(angle);
        }
        _ => {
            let tx = finite_or(m.ops.extreme(), 0.0);
            let ty = finite_or(m.ops.extreme(), 0.0);
            m.cr.translate(tx, ty);
        }
    }
}

pub(crate) fn transform(m: &mut Machine<'_>) {
    let matrix = invertible_or_identity(m.ops.matrix());
    m.cr.transform(matrix);
}

pub(crate) fn set_matrix(m: &mut Machine<'_>) {
    let matrix = invertible_or_identity(m.ops.matrix());
    m.cr.set_matrix(matrix);
}

/// Either resets to the identity or replaces the CTM with its inverse.
pub(crate) fn invert_matrix(m: &mut Machine<'_>) {
    if m.ops.flag() {
        m.cr.identity_matrix();
        return;
    }
    match m.cr.matrix().try_invert() {
        Ok(inverse) => m.cr.set_matrix(inverse),
        Err(_) => m.cr.identity_matrix(),
    }
}

pub(crate) fn save(m: &mut Machine<'_>) {
    if m.push_frame(Frame::Save) {
        let _ = m.cr.save();
    }
}

/// Only unwinds a save; a restore across an open group is skipped.
pub(crate) fn restore(m: &mut Machine<'_>) {
    if m.pop_frame(Frame::Save) {
        let _ = m.cr.restore();
    }
}
