//! Minimal reproducers for failures found by the harness.
//!
//! Each program replays a fixed call sequence against a fresh 500x500 image
//! with a white background. On an unpatched cairo they crash or hang, so the
//! tests that call them are ignored by default.

use std::f64::consts::TAU;

use cairo::{Context, Format, ImageSurface};

use crate::{Result, CANVAS_EXTENT};

/// A named reproducer.
#[derive(Debug, Clone, Copy)]
pub struct Repro {
    pub name: &'static str,
    pub summary: &'static str,
    pub run: fn() -> Result<()>,
}

/// Every known reproducer.
pub const ALL: [Repro; 2] = [
    Repro {
        name: "curve_miter_stroke",
        summary: "stroking a curve with extreme control points and a zero miter limit",
        run: curve_miter_stroke,
    },
    Repro {
        name: "arc_tiny_radius",
        summary: "arc with a subnormal radius and an enormous start angle",
        run: arc_tiny_radius,
    },
];

/// Looks up a reproducer by name.
pub fn find(name: &str) -> Option<&'static Repro> {
    ALL.iter().find(|repro| repro.name == name)
}

fn white_canvas() -> Result<(ImageSurface, Context)> {
    let surface = ImageSurface::create(Format::ARgb32, CANVAS_EXTENT, CANVAS_EXTENT)?;
    let cr = Context::new(&surface)?;
    cr.set_source_rgb(1.0, 1.0, 1.0);
    cr.paint()?;
    Ok((surface, cr))
}

/// Curve whose control points are raw bit patterns, stroked with miter
/// limit 0.
pub fn curve_miter_stroke() -> Result<()> {
    let (_surface, cr) = white_canvas()?;
    let [x1, y1, x2, y2, x3, y3] = [
        0x0001_fffd_0002_0000_u64,
        0x0002_3b00_1401_ffff,
        0xffff_f800_00ff_f624,
        0xfffe_0102_3b00_1401,
        0xd8ff_0105_6d02_bafa,
        0x0000_0000_0000_0000,
    ]
    .map(f64::from_bits);
    cr.curve_to(x1, y1, x2, y2, x3, y3);
    cr.set_miter_limit(0.0);
    // the stroke itself is the trigger; its status is irrelevant
    let _ = cr.stroke();
    Ok(())
}

/// Arc with subnormal centre and radius and a start angle of ~1e16 turns.
pub fn arc_tiny_radius() -> Result<()> {
    let (_surface, cr) = white_canvas()?;
    cr.arc(
        4.18773154961833e-294,
        -3.988094816959602e-16,
        1.5314697853761904e-231,
        9422236867459448.0 * TAU,
        1.7576384591071336e-295 * TAU,
    );
    Ok(())
}
