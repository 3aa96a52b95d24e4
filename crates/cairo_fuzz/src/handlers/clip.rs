//! Clipping.

use super::Machine;

pub(crate) fn clip_rect(m: &mut Machine<'_>) {
    let (x, y) = m.ops.point();
    let (width, height) = m.ops.point();
    m.cr.rectangle(x, y, width, height);
    m.cr.clip();
}

pub(crate) fn clip_preserve(m: &mut Machine<'_>) {
    m.cr.clip_preserve();
}

pub(crate) fn reset_clip(m: &mut Machine<'_>) {
    m.cr.reset_clip();
}

/// Extents, point containment and the rectangle list of the current clip.
pub(crate) fn clip_query(m: &mut Machine<'_>) {
    let x = m.ops.canvas_coord();
    let y = m.ops.canvas_coord();
    let _ = m.cr.clip_extents();
    let _ = m.cr.in_clip(x, y);
    if let Ok(list) = m.cr.copy_clip_rectangle_list() {
        let _ = list.iter().map(|r| r.width() * r.height()).sum::<f64>();
    }
}
