//! Group rendering.

use cairo::Content;

use super::{Frame, Machine};
use crate::operands::clamp_unit;

pub(crate) const CONTENTS: [Content; 3] = [Content::Color, Content::Alpha, Content::ColorAlpha];

pub(crate) fn push_group(m: &mut Machine<'_>) {
    let selector = m.ops.selector(CONTENTS.len() + 1);
    if !m.push_frame(Frame::Group) {
        return;
    }
    match selector.checked_sub(1) {
        None => m.cr.push_group(),
        Some(i) => m.cr.push_group_with_content(CONTENTS[i]),
    }
}

/// Pops the innermost group into the source and paints it.
pub(crate) fn pop_group(m: &mut Machine<'_>) {
    let alpha = clamp_unit(m.ops.unit());
    if !m.pop_frame(Frame::Group) {
        return;
    }
    if m.cr.pop_group_to_source().is_ok() {
        let _ = m.cr.paint_with_alpha(alpha);
    }
}
