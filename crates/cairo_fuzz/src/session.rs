//! Session lifecycle and the dispatch loop.
//!
//! A session owns one drawing target and one context. It paints a white
//! background, runs opcodes until the input, the budget or the deadline runs
//! out, then finalizes vector streams and releases the context before the
//! target.

use std::rc::Rc;
use std::time::{Duration, Instant};

use cairo::Context;

use crate::backend::{Backend, Snapshot, Target};
use crate::handlers::Machine;
use crate::ledger::{Ledger, LedgerCounts, ResourceKind, Tracked};
use crate::opcode::Opcode;
use crate::operands::Operands;
use crate::{HarnessError, Result, DEFAULT_MAX_OPS, DEFAULT_SEED};

/// Knobs for a single session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of opcodes executed
    pub max_ops: usize,
    /// Inputs shorter than this are rejected without creating a target
    pub min_len: usize,
    /// Seed for the in-canvas jitter generator
    pub seed: u64,
    /// Wall-clock limit, checked before each opcode
    pub deadline: Option<Duration>,
    /// Keep the executed opcode sequence in the report
    pub record_trace: bool,
    /// Read the final canvas back as RGBA pixels
    pub capture: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_ops: DEFAULT_MAX_OPS,
            min_len: 1,
            seed: DEFAULT_SEED,
            deadline: None,
            record_trace: false,
            capture: false,
        }
    }
}

/// Why the dispatch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// No opcode byte left
    Exhausted,
    /// `max_ops` opcodes ran
    Budget,
    /// The deadline passed
    Deadline,
}

/// The first error status the drawing context entered.
///
/// The status is sticky: later drawing calls on the context are no-ops, while
/// opcodes that build standalone objects keep running.
#[derive(Debug, Clone)]
pub struct ContextFault {
    /// Index of the opcode in the executed sequence
    pub op_index: usize,
    pub opcode: Opcode,
    pub status: cairo::Error,
}

/// Outcome of a completed session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub backend: Backend,
    pub ops_executed: usize,
    /// Input bytes consumed, including the backend selector
    pub bytes_consumed: usize,
    pub stop: StopReason,
    /// Set once the context reports an error status
    pub context_fault: Option<ContextFault>,
    /// Executed opcodes; empty unless `record_trace` was set
    pub trace: Vec<Opcode>,
    /// Create/release counts, taken after everything was released
    pub resources: LedgerCounts,
    /// Final canvas, when `capture` was set and the backend has pixels
    pub snapshot: Option<Snapshot>,
}

struct Loop {
    ops_executed: usize,
    bytes_consumed: usize,
    stop: StopReason,
    context_fault: Option<ContextFault>,
    trace: Vec<Opcode>,
}

/// Target and context of a running session.
///
/// Field order matters: the context is dropped before the target.
struct Session {
    cr: Tracked<Context>,
    target: Tracked<Target>,
}

impl Session {
    fn open(backend: Backend, ledger: &Rc<Ledger>) -> Result<Self> {
        let target = ledger.track(ResourceKind::Target, Target::create(backend)?);
        let cr = Context::new(target.surface()).map_err(HarnessError::ContextCreation)?;
        let cr = ledger.track(ResourceKind::Context, cr);
        cr.status().map_err(HarnessError::ContextCreation)?;

        cr.set_source_rgb(1.0, 1.0, 1.0);
        cr.paint()?;
        cr.set_source_rgb(0.0, 0.0, 0.0);
        Ok(Self { cr, target })
    }

    /// Finalizes the target, releases the context and then reads the
    /// canvas back if asked to. The target is released on return.
    fn close(self, capture: bool) -> Result<Option<Snapshot>> {
        let Session { cr, target } = self;
        target.finalize(&cr);
        drop(cr);
        if capture {
            target.snapshot()
        } else {
            Ok(None)
        }
    }
}

fn dispatch(machine: &mut Machine<'_>, config: &SessionConfig, deadline: Option<Instant>) -> Loop {
    let mut ops_executed = 0;
    let mut trace = Vec::new();
    let mut context_fault = None;
    let stop = loop {
        if ops_executed >= config.max_ops {
            break StopReason::Budget;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break StopReason::Deadline;
        }
        let Some(byte) = machine.ops.next_opcode() else {
            break StopReason::Exhausted;
        };
        let opcode = Opcode::from_byte(byte);
        tracing::trace!(%opcode, remaining = machine.ops.remaining(), "dispatch");
        opcode.run(machine);
        if context_fault.is_none() {
            if let Err(status) = machine.cr.status() {
                tracing::debug!(%opcode, %status, "context entered an error state");
                context_fault = Some(ContextFault {
                    op_index: ops_executed,
                    opcode,
                    status,
                });
            }
        }
        ops_executed += 1;
        if config.record_trace {
            trace.push(opcode);
        }
    };
    tracing::trace!(open_frames = machine.depth(), ?stop, "dispatch finished");
    Loop {
        ops_executed,
        bytes_consumed: machine.ops.cursor().position(),
        stop,
        context_fault,
        trace,
    }
}

/// Interprets `data` as a program against a fresh drawing session.
///
/// The first byte selects the backend; the rest is a stream of opcodes and
/// their operands. Every input is accepted except those shorter than
/// `config.min_len`. Errors describe setup failures, never findings.
///
/// # Example
///
/// ```no_run
/// use cairo_fuzz::{run_session, Backend, SessionConfig, StopReason};
///
/// // backend 1 (PDF), then a single ClosePath
/// let report = run_session(&[1, 6], &SessionConfig::default())?;
/// assert_eq!(report.backend, Backend::Pdf);
/// assert_eq!(report.ops_executed, 1);
/// assert_eq!(report.stop, StopReason::Exhausted);
/// # Ok::<(), cairo_fuzz::HarnessError>(())
/// ```
pub fn run_session(data: &[u8], config: &SessionConfig) -> Result<SessionReport> {
    if data.len() < config.min_len {
        return Err(HarnessError::InputTooShort {
            len: data.len(),
            min: config.min_len,
        });
    }
    let deadline = config.deadline.map(|limit| Instant::now() + limit);

    let ledger = Ledger::new();
    let mut ops = Operands::new(data, config.seed);
    let backend = Backend::from_byte(ops.byte());
    let session = Session::open(backend, &ledger)?;
    tracing::debug!(?backend, len = data.len(), "session opened");

    let outcome = {
        let mut machine = Machine::new(&session.cr, ops, Rc::clone(&ledger));
        dispatch(&mut machine, config, deadline)
    };
    let snapshot = session.close(config.capture)?;
    let resources = ledger.counts();

    tracing::debug!(
        ops = outcome.ops_executed,
        stop = ?outcome.stop,
        faulted = outcome.context_fault.is_some(),
        balanced = resources.is_balanced(),
        "session closed"
    );
    Ok(SessionReport {
        backend,
        ops_executed: outcome.ops_executed,
        bytes_consumed: outcome.bytes_consumed,
        stop: outcome.stop,
        context_fault: outcome.context_fault,
        trace: outcome.trace,
        resources,
        snapshot,
    })
}
