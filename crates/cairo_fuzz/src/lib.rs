//! # cairo_fuzz
//!
//! A stateful fuzzing harness for the cairo 2D graphics library.
//!
//! The harness treats its input as a program: a small interpreter reads
//! opcode bytes, decodes operands from the bytes that follow, and issues the
//! matching cairo calls against a single drawing session. Decoding is total,
//! so every byte string (including the empty one) is a valid program.
//!
//! ## Features
//!
//! - **Backends**: raster image, PDF stream, SVG stream and recording targets
//! - **Extreme values**: roughly three in seven decoded doubles are NaN,
//!   infinite, huge or subnormal
//! - **Bounded sessions**: an operation budget and an optional deadline stop
//!   adversarial inputs
//!
//! ## Quick Start
//!
//! ### From a fuzzing engine
//!
//! ```ignore
//! libfuzzer_sys::fuzz_target!(|data: &[u8]| {
//!     cairo_fuzz::fuzz_one_input(data);
//! });
//! ```
//!
//! ### Inspecting a session
//!
//! ```no_run
//! use cairo_fuzz::{run_session, SessionConfig};
//!
//! let config = SessionConfig {
//!     record_trace: true,
//!     ..SessionConfig::default()
//! };
//! let report = run_session(b"\x00\x0b\x01\x02", &config)?;
//! println!("{:?}: {} ops, stopped on {:?}", report.backend, report.ops_executed, report.stop);
//! # Ok::<(), cairo_fuzz::HarnessError>(())
//! ```

use thiserror::Error;

pub mod backend;
pub mod cursor;
pub mod extreme;
mod handlers;
pub mod ledger;
pub mod opcode;
pub mod operands;
pub mod repro;
pub mod session;

pub use backend::{Backend, Snapshot};
pub use cursor::ByteCursor;
pub use extreme::Jitter;
pub use ledger::{LedgerCounts, ResourceKind};
pub use opcode::{Opcode, OPCODE_COUNT};
pub use operands::Operands;
pub use session::{run_session, ContextFault, SessionConfig, SessionReport, StopReason};

/// Errors that end a session before or instead of running the dispatcher.
///
/// None of these are findings. The entry point swallows them; only crashes
/// inside cairo count as results.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Input shorter than the configured minimum
    #[error("input too short: {len} bytes, need at least {min}")]
    InputTooShort { len: usize, min: usize },

    /// The drawing target could not be created or reported an error status
    #[error("failed to create {backend:?} target: {source}")]
    TargetCreation {
        backend: Backend,
        #[source]
        source: cairo::Error,
    },

    /// The drawing context could not be created or reported an error status
    #[error("failed to create drawing context: {0}")]
    ContextCreation(#[source] cairo::Error),

    /// Pixel data could not be read back from the canvas
    #[error("snapshot failed: {0}")]
    Snapshot(String),

    /// Any other cairo failure
    #[error(transparent)]
    Cairo(#[from] cairo::Error),
}

/// Result type for harness operations.
pub type Result<T> = core::result::Result<T, HarnessError>;

/// Side length of the square canvas every backend renders into.
pub const CANVAS_EXTENT: i32 = 500;

/// Default operation budget per session.
pub const DEFAULT_MAX_OPS: usize = 2000;

/// Default seed for the jitter generator.
pub const DEFAULT_SEED: u64 = 0x00C0_FFEE_D15E_A5E5;

/// Fuzzing entry point.
///
/// Runs one session over `data` with the default configuration and always
/// returns 0. Findings surface only as crashes or sanitizer reports.
pub fn fuzz_one_input(data: &[u8]) -> i32 {
    if let Err(err) = run_session(data, &SessionConfig::default()) {
        tracing::debug!(%err, "session aborted");
    }
    0
}
