//! Read-only queries, regions and page control.

use cairo::{RectangleInt, Region};

use super::Machine;
use crate::ledger::ResourceKind;
use crate::operands::finite_or;

/// Bound on how many rectangles of a combined region are enumerated.
const MAX_REGION_RECTANGLES: i32 = 64;
const MAX_FALLBACK_RESOLUTION: f64 = 1200.0;

pub(crate) fn path_query(m: &mut Machine<'_>) {
    let x = m.ops.canvas_coord();
    let y = m.ops.canvas_coord();
    let _ = m.cr.fill_extents();
    let _ = m.cr.stroke_extents();
    let _ = m.cr.path_extents();
    let _ = m.cr.in_fill(x, y);
    let _ = m.cr.in_stroke(x, y);
    let _ = m.cr.current_point();
}

pub(crate) fn text_query(m: &mut Machine<'_>) {
    let text = m.ops.string();
    let _ = m.cr.font_extents();
    let _ = m.cr.text_extents(&text);
}

fn int_rectangle(m: &mut Machine<'_>) -> RectangleInt {
    let x = m.ops.i32();
    let y = m.ops.i32();
    let width = i32::from(m.ops.u16());
    let height = i32::from(m.ops.u16());
    RectangleInt::new(x, y, width, height)
}

/// Combines two integer rectangles as regions and inspects the result.
pub(crate) fn region_ops(m: &mut Machine<'_>) {
    let a = int_rectangle(m);
    let b = int_rectangle(m);
    let first = m.track(ResourceKind::Region, Region::create_rectangle(&a));
    let second = m.track(ResourceKind::Region, Region::create_rectangle(&b));
    let _ = match m.ops.selector(4) {
        0 => first.union(&second),
        1 => first.intersect(&second),
        2 => first.subtract(&second),
        _ => first.xor(&second),
    };
    let _ = first.contains_point(m.ops.i32(), m.ops.i32());
    let _ = first.contains_rectangle(&b);
    let extents = RectangleInt::new(0, 0, 0, 0);
    first.extents(&extents);
    for nth in 0..first.num_rectangles().min(MAX_REGION_RECTANGLES) {
        let _ = first.rectangle(nth);
    }
}

/// Emits or copies a page, or adjusts the target's device offset or
/// fallback resolution.
pub(crate) fn page_ops(m: &mut Machine<'_>) {
    match m.ops.selector(4) {
        0 => {
            let _ = m.cr.show_page();
        }
        1 => {
            let _ = m.cr.copy_page();
        }
        2 => {
            let dx = finite_or(m.ops.extreme(), 0.0);
            let dy = finite_or(m.ops.extreme(), 0.0);
            let target = m.track(ResourceKind::Surface, m.cr.target());
            target.set_device_offset(dx, dy);
        }
        _ => {
            let dpi = m.ops.dimension().min(MAX_FALLBACK_RESOLUTION);
            let target = m.track(ResourceKind::Surface, m.cr.target());
            target.set_fallback_resolution(dpi, dpi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::operands::Operands;
    use cairo::{Context, Format, ImageSurface};
    use std::rc::Rc;

    fn int_rectangle_bytes(x: i32, y: i32, width: u16, height: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out
    }

    #[test]
    fn test_region_ops_consumes_operands_and_releases_regions() {
        let surface = ImageSurface::create(Format::ARgb32, 16, 16).expect("surface");
        let cr = Context::new(&surface).expect("context");

        for selector in 0u8..4 {
            let mut data = int_rectangle_bytes(0, 0, 10, 10);
            data.extend(int_rectangle_bytes(5, 5, 10, 10));
            data.push(selector);
            data.extend_from_slice(&2i32.to_le_bytes());
            data.extend_from_slice(&2i32.to_le_bytes());

            let ledger = Ledger::new();
            let mut m = Machine::new(&cr, Operands::new(&data, 0), Rc::clone(&ledger));
            region_ops(&mut m);
            assert_eq!(m.ops.remaining(), 0, "selector {selector}");
            drop(m);

            let counts = ledger.counts();
            assert_eq!(counts.created(ResourceKind::Region), 2);
            assert!(counts.is_balanced(), "{counts:?}");
        }
    }
}
