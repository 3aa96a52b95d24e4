//! Fonts, text and glyphs.

use cairo::{
    FontFace, FontOptions, HintMetrics, HintStyle, Matrix, SubpixelOrder, TextClusterFlags,
};

use super::style::ANTIALIAS_MODES;
use super::Machine;
use crate::ledger::ResourceKind;
use crate::operands::clamp_positive;

const DEFAULT_FONT_SIZE: f64 = 12.0;
/// Larger sizes spend seconds rasterizing a single glyph.
const MAX_FONT_SIZE: f64 = 4096.0;

const SUBPIXEL_ORDERS: [SubpixelOrder; 5] = [
    SubpixelOrder::Default,
    SubpixelOrder::Rgb,
    SubpixelOrder::Bgr,
    SubpixelOrder::Vrgb,
    SubpixelOrder::Vbgr,
];

const HINT_STYLES: [HintStyle; 5] = [
    HintStyle::Default,
    HintStyle::None,
    HintStyle::Slight,
    HintStyle::Medium,
    HintStyle::Full,
];

const HINT_METRICS: [HintMetrics; 3] = [HintMetrics::Default, HintMetrics::Off, HintMetrics::On];

/// Tag name and attribute string pairs understood by the PDF backend.
const TAGS: [(&str, &str); 4] = [
    ("Link", "uri='https://cairographics.org'"),
    ("cairo.dest", "name='fuzz'"),
    ("H1", ""),
    ("P", ""),
];

/// Toy face from a known family, or from an arbitrary input string.
pub(crate) fn font_face(m: &mut Machine<'_>) {
    let fuzzed_family = if m.ops.flag() {
        Some(m.ops.string())
    } else {
        None
    };
    let toy = m.ops.font_face();
    let family = fuzzed_family.as_deref().unwrap_or(toy.family);
    let Ok(face) = FontFace::toy_create(family, toy.slant, toy.weight) else {
        return;
    };
    let face = m.track(ResourceKind::FontFace, face);
    m.cr.set_font_face(&face);
}

pub(crate) fn font_size(m: &mut Machine<'_>) {
    let size = clamp_positive(m.ops.extreme().abs() * 50.0, DEFAULT_FONT_SIZE).min(MAX_FONT_SIZE);
    m.cr.set_font_size(size);
}

/// A fuzzed font matrix with components capped at the font-size limit.
/// Singular matrices are skipped.
pub(crate) fn font_matrix(m: &mut Machine<'_>) {
    let raw = m.ops.matrix();
    let cap = |v: f64| v.clamp(-MAX_FONT_SIZE, MAX_FONT_SIZE);
    let matrix = Matrix::new(
        cap(raw.xx()),
        cap(raw.yx()),
        cap(raw.xy()),
        cap(raw.yy()),
        cap(raw.x0()),
        cap(raw.y0()),
    );
    if matrix.try_invert().is_ok() {
        m.cr.set_font_matrix(matrix);
    }
}

pub(crate) fn font_options(m: &mut Machine<'_>) {
    let Ok(options) = FontOptions::new() else {
        return;
    };
    let mut options = m.track(ResourceKind::FontOptions, options);
    options.set_antialias(ANTIALIAS_MODES[m.ops.selector(ANTIALIAS_MODES.len())]);
    options.set_subpixel_order(SUBPIXEL_ORDERS[m.ops.selector(SUBPIXEL_ORDERS.len())]);
    options.set_hint_style(HINT_STYLES[m.ops.selector(HINT_STYLES.len())]);
    options.set_hint_metrics(HINT_METRICS[m.ops.selector(HINT_METRICS.len())]);
    m.cr.set_font_options(&options);
}

pub(crate) fn show_text(m: &mut Machine<'_>) {
    let x = m.ops.canvas_coord();
    let y = m.ops.canvas_coord();
    let text = m.ops.string();
    m.cr.move_to(x, y);
    let _ = m.cr.show_text(&text);
}

/// Adds the outline of a string to the path and fills it, keeping the path.
pub(crate) fn text_path(m: &mut Machine<'_>) {
    let x = m.ops.canvas_coord();
    let y = m.ops.canvas_coord();
    let text = m.ops.string();
    m.cr.move_to(x, y);
    m.cr.text_path(&text);
    let _ = m.cr.fill_preserve();
}

pub(crate) fn glyphs(m: &mut Machine<'_>) {
    let glyphs = m.ops.glyphs();
    if m.ops.flag() {
        let _ = m.cr.show_glyphs(&glyphs);
    } else {
        m.cr.glyph_path(&glyphs);
        let _ = m.cr.fill();
    }
    let _ = m.cr.glyph_extents(&glyphs);
}

/// Text, glyphs and a cluster mapping that covers both exactly.
pub(crate) fn show_text_glyphs(m: &mut Machine<'_>) {
    let text = m.ops.string();
    let glyphs = m.ops.glyphs();
    let flags = if m.ops.flag() {
        TextClusterFlags::Backward
    } else {
        TextClusterFlags::None
    };
    let clusters = m.ops.clusters(text.len(), glyphs.len());
    let _ = m.cr.show_text_glyphs(&text, &glyphs, &clusters, flags);
}

/// Wraps a small filled rectangle in a structure or link tag.
pub(crate) fn tag(m: &mut Machine<'_>) {
    let (name, attributes) = TAGS[m.ops.selector(TAGS.len())];
    let x = m.ops.canvas_coord();
    let y = m.ops.canvas_coord();
    m.cr.tag_begin(name, attributes);
    m.cr.rectangle(x, y, 10.0, 10.0);
    let _ = m.cr.fill();
    m.cr.tag_end(name);
}

/// Shapes a string with the current scaled font and draws the result.
pub(crate) fn scaled_font_glyphs(m: &mut Machine<'_>) {
    let x = m.ops.canvas_coord();
    let y = m.ops.canvas_coord();
    let text = m.ops.string();
    let font = m.track(ResourceKind::ScaledFont, m.cr.scaled_font());
    if font.status().is_err() {
        return;
    }
    if let Ok((glyphs, _clusters)) = font.text_to_glyphs(x, y, &text) {
        let _ = m.cr.show_glyphs(&glyphs);
        let _ = font.glyph_extents(&glyphs);
    }
    let _ = font.text_extents(&text);
}
