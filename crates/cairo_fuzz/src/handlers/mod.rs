//! Opcode handlers.
//!
//! Each handler decodes its own operands and issues one family of cairo
//! calls. Handlers never fail: a call that returns an error is dropped, and
//! the dispatcher notices a sticky context error through the status check
//! after every step.

use std::rc::Rc;

use cairo::{Context, ImageSurface, Matrix, Pattern};

use crate::ledger::{Ledger, ResourceKind, Tracked};
use crate::operands::Operands;

pub(crate) mod clip;
pub(crate) mod group;
pub(crate) mod image;
pub(crate) mod paint;
pub(crate) mod path;
pub(crate) mod query;
pub(crate) mod source;
pub(crate) mod style;
pub(crate) mod text;
pub(crate) mod transform;

/// Deepest save/group nesting a session may build.
pub(crate) const MAX_FRAMES: usize = 32;

/// An open save or group on the context's state stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Frame {
    Save,
    Group,
}

/// Interpreter state handed to every handler.
pub(crate) struct Machine<'a> {
    pub(crate) cr: &'a Context,
    pub(crate) ops: Operands<'a>,
    ledger: Rc<Ledger>,
    frames: Vec<Frame>,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(cr: &'a Context, ops: Operands<'a>, ledger: Rc<Ledger>) -> Self {
        Self {
            cr,
            ops,
            ledger,
            frames: Vec::with_capacity(MAX_FRAMES),
        }
    }

    #[inline]
    pub(crate) fn track<T>(&self, kind: ResourceKind, value: T) -> Tracked<T> {
        self.ledger.track(kind, value)
    }

    /// Makes `pattern` the context's source unless the pattern is already in
    /// an error state. Returns whether the source was replaced.
    pub(crate) fn install_source(&self, pattern: &Pattern) -> bool {
        if pattern.status().is_err() {
            return false;
        }
        self.cr.set_source(pattern).is_ok()
    }

    /// Relative path operations need a current point; start one at the
    /// canvas centre when the path has none.
    pub(crate) fn ensure_current_point(&self) {
        if !self.cr.has_current_point().unwrap_or(false) {
            let centre = f64::from(crate::CANVAS_EXTENT) / 2.0;
            self.cr.move_to(centre, centre);
        }
    }

    /// Opens a frame if the nesting limit allows it.
    pub(crate) fn push_frame(&mut self, frame: Frame) -> bool {
        if self.frames.len() >= MAX_FRAMES {
            return false;
        }
        self.frames.push(frame);
        true
    }

    /// Closes the innermost frame if it has the expected kind.
    pub(crate) fn pop_frame(&mut self, frame: Frame) -> bool {
        if self.frames.last() != Some(&frame) {
            return false;
        }
        self.frames.pop();
        true
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// `matrix` when cairo can invert it, otherwise the identity.
pub(crate) fn invertible_or_identity(matrix: Matrix) -> Matrix {
    if matrix.try_invert().is_ok() {
        matrix
    } else {
        Matrix::identity()
    }
}

/// Copies input bytes straight into the surface's pixel memory, never past
/// its `stride * height` capacity. Returns the number of bytes written.
pub(crate) fn fill_from_input(surface: &mut ImageSurface, ops: &mut Operands<'_>) -> usize {
    let Ok(mut data) = surface.data() else {
        return 0;
    };
    let src = ops.bytes(data.len());
    data[..src.len()].copy_from_slice(src);
    src.len()
}
