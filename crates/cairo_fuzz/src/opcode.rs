//! The opcode catalogue.
//!
//! An opcode byte selects entry `byte % OPCODE_COUNT` of a fixed table.
//! Every byte value therefore maps to exactly one handler, and appending new
//! entries is the only change that shifts existing corpora.

use std::fmt;

use crate::handlers::{self, Machine};

/// Number of entries in the opcode table.
pub const OPCODE_COUNT: usize = 61;

/// One interpreter instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Opcode {
    MoveTo,
    LineTo,
    CurveTo,
    RelMoveTo,
    RelLineTo,
    RelCurveTo,
    ClosePath,
    NewPath,
    NewSubPath,
    Arc,
    ArcNegative,
    Rectangle,
    ReplayPath,
    Stroke,
    Fill,
    StrokePreserve,
    FillPreserve,
    FillRule,
    Paint,
    LineWidth,
    LineCap,
    LineJoin,
    MiterLimit,
    Dash,
    Tolerance,
    Antialias,
    Operator,
    TransformStep,
    Transform,
    SetMatrix,
    InvertMatrix,
    Save,
    Restore,
    SourceRgba,
    LinearGradient,
    RadialGradient,
    TiledPattern,
    MeshPattern,
    TargetAsSource,
    MaskGradient,
    ClipRect,
    ClipPreserve,
    ResetClip,
    ClipQuery,
    FontFace,
    FontSize,
    FontMatrix,
    FontOptions,
    ShowText,
    TextPath,
    Glyphs,
    ShowTextGlyphs,
    Tag,
    ScaledFontGlyphs,
    PushGroup,
    PopGroup,
    ImageStress,
    PathQuery,
    TextQuery,
    RegionOps,
    PageOps,
}

type Handler = fn(&mut Machine<'_>);

struct Entry {
    opcode: Opcode,
    name: &'static str,
    run: Handler,
}

macro_rules! table {
    ($($opcode:ident => $run:path),* $(,)?) => {
        [$(Entry {
            opcode: Opcode::$opcode,
            name: stringify!($opcode),
            run: $run,
        }),*]
    };
}

const TABLE: [Entry; OPCODE_COUNT] = table![
    MoveTo => handlers::path::move_to,
    LineTo => handlers::path::line_to,
    CurveTo => handlers::path::curve_to,
    RelMoveTo => handlers::path::rel_move_to,
    RelLineTo => handlers::path::rel_line_to,
    RelCurveTo => handlers::path::rel_curve_to,
    ClosePath => handlers::path::close_path,
    NewPath => handlers::path::new_path,
    NewSubPath => handlers::path::new_sub_path,
    Arc => handlers::path::arc,
    ArcNegative => handlers::path::arc_negative,
    Rectangle => handlers::path::rectangle,
    ReplayPath => handlers::path::replay_path,
    Stroke => handlers::paint::stroke,
    Fill => handlers::paint::fill,
    StrokePreserve => handlers::paint::stroke_preserve,
    FillPreserve => handlers::paint::fill_preserve,
    FillRule => handlers::paint::fill_rule,
    Paint => handlers::paint::paint,
    LineWidth => handlers::style::line_width,
    LineCap => handlers::style::line_cap,
    LineJoin => handlers::style::line_join,
    MiterLimit => handlers::style::miter_limit,
    Dash => handlers::style::dash,
    Tolerance => handlers::style::tolerance,
    Antialias => handlers::style::antialias,
    Operator => handlers::style::operator,
    TransformStep => handlers::transform::transform_step,
    Transform => handlers::transform::transform,
    SetMatrix => handlers::transform::set_matrix,
    InvertMatrix => handlers::transform::invert_matrix,
    Save => handlers::transform::save,
    Restore => handlers::transform::restore,
    SourceRgba => handlers::source::source_rgba,
    LinearGradient => handlers::source::linear_gradient,
    RadialGradient => handlers::source::radial_gradient,
    TiledPattern => handlers::source::tiled_pattern,
    MeshPattern => handlers::source::mesh_pattern,
    TargetAsSource => handlers::source::target_as_source,
    MaskGradient => handlers::source::mask_gradient,
    ClipRect => handlers::clip::clip_rect,
    ClipPreserve => handlers::clip::clip_preserve,
    ResetClip => handlers::clip::reset_clip,
    ClipQuery => handlers::clip::clip_query,
    FontFace => handlers::text::font_face,
    FontSize => handlers::text::font_size,
    FontMatrix => handlers::text::font_matrix,
    FontOptions => handlers::text::font_options,
    ShowText => handlers::text::show_text,
    TextPath => handlers::text::text_path,
    Glyphs => handlers::text::glyphs,
    ShowTextGlyphs => handlers::text::show_text_glyphs,
    Tag => handlers::text::tag,
    ScaledFontGlyphs => handlers::text::scaled_font_glyphs,
    PushGroup => handlers::group::push_group,
    PopGroup => handlers::group::pop_group,
    ImageStress => handlers::image::image_stress,
    PathQuery => handlers::query::path_query,
    TextQuery => handlers::query::text_query,
    RegionOps => handlers::query::region_ops,
    PageOps => handlers::query::page_ops,
];

impl Opcode {
    /// Every opcode in table order.
    pub const ALL: [Opcode; OPCODE_COUNT] = {
        let mut all = [Opcode::MoveTo; OPCODE_COUNT];
        let mut i = 0;
        while i < OPCODE_COUNT {
            all[i] = TABLE[i].opcode;
            i += 1;
        }
        all
    };

    /// Decodes an opcode byte. Total over `u8`.
    #[inline]
    pub fn from_byte(byte: u8) -> Self {
        Self::ALL[byte as usize % OPCODE_COUNT]
    }

    /// Smallest byte that decodes to this opcode.
    #[inline]
    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        TABLE[self as usize].name
    }

    pub(crate) fn run(self, machine: &mut Machine<'_>) {
        (TABLE[self as usize].run)(machine)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_discriminants() {
        for (i, entry) in TABLE.iter().enumerate() {
            assert_eq!(entry.opcode as usize, i, "{} out of place", entry.name);
        }
    }

    #[test]
    fn test_every_byte_decodes() {
        for byte in 0..=u8::MAX {
            let opcode = Opcode::from_byte(byte);
            assert_eq!(opcode.byte() as usize, byte as usize % OPCODE_COUNT);
        }
        assert_eq!(Opcode::from_byte(61), Opcode::MoveTo);
        assert_eq!(Opcode::from_byte(255), Opcode::ALL[255 % OPCODE_COUNT]);
    }

    #[test]
    fn test_names() {
        assert_eq!(Opcode::MoveTo.name(), "MoveTo");
        assert_eq!(Opcode::PageOps.name(), "PageOps");
        assert_eq!(Opcode::ShowTextGlyphs.to_string(), "ShowTextGlyphs");
    }
}
