//! Source patterns and masks.

use cairo::{
    Extend, Filter, Format, Gradient, ImageSurface, LinearGradient, Mesh, MeshCorner,
    RadialGradient, SurfacePattern,
};

use super::{fill_from_input, invertible_or_identity, Machine};
use crate::ledger::ResourceKind;
use crate::operands::{clamp_positive, finite_or, ColorStop};

pub(crate) const EXTENDS: [Extend; 4] = [Extend::None, Extend::Repeat, Extend::Reflect, Extend::Pad];

const FILTERS: [Filter; 6] = [
    Filter::Fast,
    Filter::Good,
    Filter::Best,
    Filter::Nearest,
    Filter::Bilinear,
    Filter::Gaussian,
];

const CORNERS: [MeshCorner; 4] = [
    MeshCorner::MeshCorner0,
    MeshCorner::MeshCorner1,
    MeshCorner::MeshCorner2,
    MeshCorner::MeshCorner3,
];

/// Largest tile edge for [`tiled_pattern`].
const MAX_TILE: usize = 64;
const MAX_MESH_PATCHES: usize = 1000;
const MAX_MESH_SEGMENTS: usize = 1000;

const DEFAULT_INNER_RADIUS: f64 = 10.0;
const DEFAULT_OUTER_RADIUS: f64 = 200.0;

fn add_stops(gradient: &Gradient, stops: &[ColorStop]) {
    for stop in stops {
        let [r, g, b, a] = stop.rgba;
        gradient.add_color_stop_rgba(stop.offset, r, g, b, a);
    }
}

pub(crate) fn source_rgba(m: &mut Machine<'_>) {
    let [r, g, b, a] = m.ops.rgba();
    m.cr.set_source_rgba(r, g, b, a);
}

pub(crate) fn linear_gradient(m: &mut Machine<'_>) {
    let (x0, y0) = m.ops.point();
    let (x1, y1) = m.ops.point();
    let stops = m.ops.color_stops();
    let gradient = m.track(ResourceKind::Pattern, LinearGradient::new(x0, y0, x1, y1));
    add_stops(&gradient, &stops);
    m.install_source(&gradient);
}

pub(crate) fn radial_gradient(m: &mut Machine<'_>) {
    let (cx0, cy0) = m.ops.point();
    let r0 = clamp_positive(m.ops.unit(), DEFAULT_INNER_RADIUS);
    let (cx1, cy1) = m.ops.point();
    let r1 = clamp_positive(m.ops.unit(), DEFAULT_OUTER_RADIUS);
    let stops = m.ops.color_stops();
    let gradient = m.track(
        ResourceKind::Pattern,
        RadialGradient::new(cx0, cy0, r0, cx1, cy1, r1),
    );
    add_stops(&gradient, &stops);
    m.install_source(&gradient);
}

/// Small image tile filled from the input, repeated with a fuzzed matrix.
pub(crate) fn tiled_pattern(m: &mut Machine<'_>) {
    let width = (m.ops.selector(MAX_TILE) + 1) as i32;
    let height = (m.ops.selector(MAX_TILE) + 1) as i32;
    let Ok(tile) = ImageSurface::create(Format::ARgb32, width, height) else {
        return;
    };
    let mut tile = m.track(ResourceKind::Surface, tile);
    fill_from_input(&mut tile, &mut m.ops);

    let pattern = m.track(ResourceKind::Pattern, SurfacePattern::create(&*tile));
    pattern.set_extend(EXTENDS[m.ops.selector(EXTENDS.len())]);
    pattern.set_filter(FILTERS[m.ops.selector(FILTERS.len())]);
    pattern.set_matrix(invertible_or_identity(m.ops.matrix()));
    m.install_source(&pattern);
}

/// Mesh of up to 1000 patches, each with up to 1000 segments.
///
/// cairo allows four sides per patch; extra segments put the mesh into an
/// error state and the remaining patches are skipped.
pub(crate) fn mesh_pattern(m: &mut Machine<'_>) {
    let mesh = m.track(ResourceKind::Pattern, Mesh::new());
    let patches = m.ops.u16() as usize % MAX_MESH_PATCHES + 1;
    for _ in 0..patches {
        let segments = m.ops.u16() as usize % (MAX_MESH_SEGMENTS + 1);
        mesh.begin_patch();
        mesh.move_to(m.ops.canvas_coord(), m.ops.canvas_coord());
        for _ in 0..segments {
            if m.ops.flag() {
                mesh.line_to(m.ops.canvas_coord(), m.ops.canvas_coord());
            } else {
                mesh.curve_to(
                    m.ops.canvas_coord(),
                    m.ops.canvas_coord(),
                    m.ops.canvas_coord(),
                    m.ops.canvas_coord(),
                    m.ops.canvas_coord(),
                    m.ops.canvas_coord(),
                );
            }
        }
        for corner in CORNERS {
            let [r, g, b, a] = m.ops.rgba();
            mesh.set_corner_color_rgba(corner, r, g, b, a);
        }
        mesh.end_patch();
        if mesh.status().is_err() {
            break;
        }
    }
    m.install_source(&mesh);
}

/// Uses the session's own target as the source.
pub(crate) fn target_as_source(m: &mut Machine<'_>) {
    let x = finite_or(m.ops.extreme(), 0.0);
    let y = finite_or(m.ops.extreme(), 0.0);
    let target = m.track(ResourceKind::Surface, m.cr.target());
    let _ = m.cr.set_source_surface(&*target, x, y);
}

/// Masks the current source with a linear gradient.
pub(crate) fn mask_gradient(m: &mut Machine<'_>) {
    let (x0, y0) = m.ops.point();
    let (x1, y1) = m.ops.point();
    let stops = m.ops.color_stops();
    let gradient = m.track(ResourceKind::Pattern, LinearGradient::new(x0, y0, x1, y1));
    add_stops(&gradient, &stops);
    if gradient.status().is_ok() {
        let _ = m.cr.mask(&*gradient);
    }
}
