//! Path construction.

use std::f64::consts::TAU;

use super::Machine;
use crate::ledger::ResourceKind;

pub(crate) fn move_to(m: &mut Machine<'_>) {
    let (x, y) = m.ops.point();
    m.cr.move_to(x, y);
}

pub(crate) fn line_to(m: &mut Machine<'_>) {
    let (x, y) = m.ops.point();
    m.cr.line_to(x, y);
}

pub(crate) fn curve_to(m: &mut Machine<'_>) {
    let (x1, y1) = m.ops.point();
    let (x2, y2) = m.ops.point();
    let (x3, y3) = m.ops.point();
    m.cr.curve_to(x1, y1, x2, y2, x3, y3);
}

pub(crate) fn rel_move_to(m: &mut Machine<'_>) {
    let (dx, dy) = m.ops.point();
    m.ensure_current_point();
    m.cr.rel_move_to(dx, dy);
}

pub(crate) fn rel_line_to(m: &mut Machine<'_>) {
    let (dx, dy) = m.ops.point();
    m.ensure_current_point();
    m.cr.rel_line_to(dx, dy);
}

pub(crate) fn rel_curve_to(m: &mut Machine<'_>) {
    let (dx1, dy1) = m.ops.point();
    let (dx2, dy2) = m.ops.point();
    let (dx3, dy3) = m.ops.point();
    m.ensure_current_point();
    m.cr.rel_curve_to(dx1, dy1, dx2, dy2, dx3, dy3);
}

pub(crate) fn close_path(m: &mut Machine<'_>) {
    m.cr.close_path();
}

pub(crate) fn new_path(m: &mut Machine<'_>) {
    m.cr.new_path();
}

pub(crate) fn new_sub_path(m: &mut Machine<'_>) {
    m.cr.new_sub_path();
}

/// Arc with raw centre, radius and angles; the angles are in turns.
pub(crate) fn arc(m: &mut Machine<'_>) {
    let xc = m.ops.raw();
    let yc = m.ops.raw();
    let radius = m.ops.unit();
    let angle1 = m.ops.raw() * TAU;
    let angle2 = m.ops.raw() * TAU;
    m.cr.arc(xc, yc, radius, angle1, angle2);
}

/// Extreme centre and radius; the angles are raw turns as in [`arc`].
pub(crate) fn arc_negative(m: &mut Machine<'_>) {
    let (xc, yc) = m.ops.point();
    let radius = m.ops.extreme().abs();
    let angle1 = m.ops.raw() * TAU;
    let angle2 = m.ops.raw() * TAU;
    m.cr.arc_negative(xc, yc, radius, angle1, angle2);
}

pub(crate) fn rectangle(m: &mut Machine<'_>) {
    let (x, y) = m.ops.point();
    let (width, height) = m.ops.point();
    m.cr.rectangle(x, y, width, height);
}

/// Copies the current path (optionally flattened), clears it and appends
/// the copy twice.
pub(crate) fn replay_path(m: &mut Machine<'_>) {
    let copied = if m.ops.flag() {
        m.cr.copy_path_flat()
    } else {
        m.cr.copy_path()
    };
    let Ok(path) = copied else {
        return;
    };
    let path = m.track(ResourceKind::Path, path);
    m.cr.new_path();
    m.cr.append_path(&path);
    m.cr.append_path(&path);
}
