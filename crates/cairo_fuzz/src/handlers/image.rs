//! Raw image surfaces.

use cairo::{Context, Format, ImageSurface, SurfacePattern};

use super::group::CONTENTS;
use super::source::EXTENDS;
use super::{fill_from_input, Machine};
use crate::ledger::ResourceKind;
use crate::operands::clamp_unit;

const FORMATS: [Format; 6] = [
    Format::ARgb32,
    Format::Rgb24,
    Format::A8,
    Format::A1,
    Format::Rgb16_565,
    Format::Rgb30,
];

/// Upper bound on the pixel memory of one stress surface.
pub(crate) const MAX_IMAGE_BYTES: usize = 16 << 20;

/// Shrinks `height` until a 4-byte-per-pixel surface fits [`MAX_IMAGE_BYTES`].
fn fit_height(width: usize, height: usize) -> usize {
    let max_rows = (MAX_IMAGE_BYTES / (width.max(1) * 4)).max(1);
    height.min(max_rows)
}

/// Fills an image of fuzzed format and size straight from the input, copies
/// part of it into a similar surface and paints that as the source.
pub(crate) fn image_stress(m: &mut Machine<'_>) {
    let format = FORMATS[m.ops.selector(FORMATS.len())];
    let width = m.ops.dimension() as usize;
    let height = fit_height(width, m.ops.dimension() as usize);
    let Ok(image) = ImageSurface::create(format, width as i32, height as i32) else {
        return;
    };
    let mut image = m.track(ResourceKind::Surface, image);
    fill_from_input(&mut image, &mut m.ops);

    let content = CONTENTS[m.ops.selector(CONTENTS.len())];
    let sub_width = (m.ops.u16() as usize % width + 1) as i32;
    let sub_height = (m.ops.u16() as usize % height + 1) as i32;
    let Ok(similar) = image.create_similar(content, sub_width, sub_height) else {
        return;
    };
    let similar = m.track(ResourceKind::Surface, similar);
    let offset_x = -m.ops.canvas_coord();
    let offset_y = -m.ops.canvas_coord();
    if let Ok(cr) = Context::new(&*similar) {
        let cr = m.track(ResourceKind::Context, cr);
        if cr.set_source_surface(&*image, offset_x, offset_y).is_ok() {
            let _ = cr.paint();
        }
    }

    let pattern = m.track(ResourceKind::Pattern, SurfacePattern::create(&*similar));
    pattern.set_extend(EXTENDS[m.ops.selector(EXTENDS.len())]);
    let alpha = clamp_unit(m.ops.unit());
    if m.install_source(&pattern) {
        let _ = m.cr.paint_with_alpha(alpha);
    }
}
