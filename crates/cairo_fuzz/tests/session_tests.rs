use cairo_fuzz::*;
use pretty_assertions::assert_eq;

/// Builds a program: backend selector, then opcodes with their operand bytes.
struct Program(Vec<u8>);

impl Program {
    fn new(backend: Backend) -> Self {
        Program(vec![backend.selector()])
    }

    fn op(mut self, opcode: Opcode) -> Self {
        self.0.push(opcode.byte());
        self
    }

    fn doubles(mut self, values: &[f64]) -> Self {
        for v in values {
            self.0.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    fn bytes(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }
}

fn traced() -> SessionConfig {
    SessionConfig {
        record_trace: true,
        ..SessionConfig::default()
    }
}

#[test]
fn test_empty_input_is_rejected() {
    let result = run_session(&[], &SessionConfig::default());
    assert!(matches!(
        result,
        Err(HarnessError::InputTooShort { len: 0, min: 1 })
    ));
    assert_eq!(fuzz_one_input(&[]), 0);
}

#[test]
fn test_three_zero_bytes() {
    // image backend; MoveTo reads nothing from a single remaining byte, so
    // that byte is the next opcode
    let report = run_session(&[0, 0, 0], &traced()).unwrap();
    assert_eq!(report.backend, Backend::Image);
    assert_eq!(report.trace, vec![Opcode::MoveTo, Opcode::MoveTo]);
    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(report.bytes_consumed, 3);
    assert!(report.resources.is_balanced());
}

#[test]
fn test_all_ff_input() {
    // every double decodes to NaN
    let data = vec![0xffu8; 1024];
    let report = run_session(&data, &traced()).unwrap();
    assert_eq!(report.backend, Backend::Recording);
    assert!(report.ops_executed > 0);
    assert!(report
        .trace
        .iter()
        .all(|&op| op == Opcode::from_byte(0xff)));
    assert!(report.resources.is_balanced());
    assert_eq!(fuzz_one_input(&data), 0);
}

#[test]
fn test_zero_filled_inputs() {
    for len in [1usize, 2, 8, 9, 17, 64, 500, 4096] {
        let data = vec![0u8; len];
        let report = run_session(&data, &SessionConfig::default()).unwrap();
        assert!(report.ops_executed <= DEFAULT_MAX_OPS, "len {len}");
        assert!(report.bytes_consumed <= len);
        assert!(report.resources.is_balanced(), "len {len}");
    }
}

#[test]
fn test_every_opcode_on_every_backend() {
    for backend in Backend::ALL {
        for (k, &opcode) in Opcode::ALL.iter().enumerate() {
            let data = Program::new(backend).op(opcode).bytes(&[0u8; 256]).0;
            let report = run_session(&data, &traced()).unwrap();
            assert_eq!(report.backend, backend);
            assert_eq!(report.trace[0], Opcode::ALL[k], "{backend:?}");
            assert!(
                report.resources.is_balanced(),
                "{opcode} on {backend:?}: {:?}",
                report.resources
            );
        }
    }
}

/// Zero-filled operands for `opcode`, `len` bytes long. ImageStress gets a
/// small in-canvas size first so its pixel fill stays short.
fn sweep_operands(opcode: Opcode, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    if opcode == Opcode::ImageStress {
        out.push(0);
        out.extend_from_slice(&6.0f64.to_le_bytes());
        out.extend_from_slice(&6.0f64.to_le_bytes());
    }
    out.resize(len.max(out.len()), 0);
    out
}

/// Input bytes `opcode` consumes when it gets `len` operand bytes and
/// `suffix` follows them.
fn consumed(opcode: Opcode, len: usize, suffix: &[u8]) -> usize {
    let mut data = vec![Backend::Recording.selector(), opcode.byte()];
    data.extend(sweep_operands(opcode, len));
    data.extend_from_slice(suffix);
    let config = SessionConfig {
        max_ops: 1,
        ..SessionConfig::default()
    };
    run_session(&data, &config).unwrap().bytes_consumed - 2
}

/// Operand length that `opcode` consumes exactly when `suffix` follows.
fn fitted_len(opcode: Opcode, suffix: &[u8]) -> Option<usize> {
    let len = consumed(opcode, 1024, suffix);
    (consumed(opcode, len, suffix) == len).then_some(len)
}

/// Reads `remaining % 64` bytes somewhere, so its length follows the suffix.
fn reads_string(opcode: Opcode, suffix: &[u8]) -> bool {
    consumed(opcode, 1024, suffix) != consumed(opcode, 1025, suffix)
}

struct Sweep {
    lens: Vec<usize>,
    /// Bytes after the last opcode; never executed
    tail: usize,
}

impl Sweep {
    fn suffix(&self, from: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for (k, &opcode) in Opcode::ALL.iter().enumerate().skip(from) {
            out.push(opcode.byte());
            out.extend(sweep_operands(opcode, self.lens[k]));
        }
        out.resize(out.len() + self.tail, 0);
        out
    }

    fn program(&self, backend: Backend) -> Vec<u8> {
        let mut data = vec![backend.selector()];
        data.extend(self.suffix(0));
        data
    }

    /// Fits opcodes from last to first. A string reader only fits when the
    /// bytes after its string are a multiple of 64, so a miss stretches the
    /// nearest later string reader (or the tail) by whole bytes until it does.
    fn build() -> Self {
        let mut sweep = Sweep {
            lens: vec![0; OPCODE_COUNT],
            tail: 0,
        };
        let mut stretchable: Option<usize> = None;
        for k in (0..OPCODE_COUNT).rev() {
            let opcode = Opcode::ALL[k];
            let len = match fitted_len(opcode, &sweep.suffix(k + 1)) {
                Some(len) => len,
                None => sweep
                    .stretch(stretchable, k)
                    .unwrap_or_else(|| panic!("no operand length fits {opcode}")),
            };
            sweep.lens[k] = len;
            if reads_string(opcode, &sweep.suffix(k + 1)) {
                stretchable = Some(k);
            }
        }
        sweep
    }

    fn stretch(&mut self, stretchable: Option<usize>, k: usize) -> Option<usize> {
        let opcode = Opcode::ALL[k];
        match stretchable {
            None => {
                for tail in 1..64 {
                    self.tail = tail;
                    if let Some(len) = fitted_len(opcode, &self.suffix(k + 1)) {
                        return Some(len);
                    }
                }
                None
            }
            Some(j) => {
                let later = Opcode::ALL[j];
                let after = self.suffix(j + 1);
                let original = self.lens[j];
                for len in original.saturating_sub(63)..=original + 63 {
                    if consumed(later, len, &after) != len {
                        continue;
                    }
                    self.lens[j] = len;
                    if let Some(fit) = fitted_len(opcode, &self.suffix(k + 1)) {
                        return Some(fit);
                    }
                }
                self.lens[j] = original;
                None
            }
        }
    }
}

#[test]
fn test_sweep_runs_every_opcode_in_order() {
    let sweep = Sweep::build();
    for backend in Backend::ALL {
        let data = sweep.program(backend);
        let config = SessionConfig {
            max_ops: OPCODE_COUNT,
            ..traced()
        };
        let report = run_session(&data, &config).unwrap();
        assert_eq!(report.trace, Opcode::ALL.to_vec(), "{backend:?}");
        assert_eq!(report.bytes_consumed, data.len() - sweep.tail);
        let expected = if sweep.tail == 0 {
            StopReason::Exhausted
        } else {
            StopReason::Budget
        };
        assert_eq!(report.stop, expected, "{backend:?}");
        assert!(
            report.resources.is_balanced(),
            "{backend:?}: {:?}",
            report.resources
        );
    }
}

#[test]
fn test_opcode_byte_wraps() {
    let report = run_session(&[0, 61 + 11], &traced()).unwrap();
    assert_eq!(report.trace, vec![Opcode::Rectangle]);
}

#[test]
fn test_budget_stops_long_programs() {
    let mut data = vec![0u8];
    data.extend(std::iter::repeat(Opcode::ClosePath.byte()).take(10_000));
    let report = run_session(&data, &SessionConfig::default()).unwrap();
    assert_eq!(report.stop, StopReason::Budget);
    assert_eq!(report.ops_executed, DEFAULT_MAX_OPS);
    assert_eq!(report.bytes_consumed, DEFAULT_MAX_OPS + 1);
}

#[test]
fn test_custom_budget() {
    let data = Program::new(Backend::Svg)
        .op(Opcode::NewPath)
        .op(Opcode::NewPath)
        .op(Opcode::NewPath)
        .0;
    let config = SessionConfig {
        max_ops: 2,
        ..traced()
    };
    let report = run_session(&data, &config).unwrap();
    assert_eq!(report.stop, StopReason::Budget);
    assert_eq!(report.trace, vec![Opcode::NewPath, Opcode::NewPath]);
}

#[test]
fn test_context_fault_is_recorded_and_dispatch_continues() {
    // 4.5 selects the tiny mode: both factors become 4.5e-300 and their
    // product underflows, which cairo reports as an invalid matrix. Region
    // operations never touch the context and still run afterwards.
    let data = Program::new(Backend::Image)
        .op(Opcode::TransformStep)
        .bytes(&[0])
        .doubles(&[4.5, 4.5])
        .op(Opcode::RegionOps)
        .bytes(&[0u8; 33])
        .op(Opcode::RegionOps)
        .bytes(&[0u8; 33])
        .op(Opcode::ClosePath)
        .0;
    let report = run_session(&data, &traced()).unwrap();
    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(
        report.trace,
        vec![
            Opcode::TransformStep,
            Opcode::RegionOps,
            Opcode::RegionOps,
            Opcode::ClosePath
        ]
    );
    assert_eq!(report.bytes_consumed, data.len());

    let fault = report.context_fault.expect("context fault");
    assert_eq!(fault.op_index, 0);
    assert_eq!(fault.opcode, Opcode::TransformStep);
    assert_eq!(report.resources.created(ResourceKind::Region), 4);
    assert!(report.resources.is_balanced());
}

#[test]
fn test_nan_operands_through_path_and_transform_handlers() {
    // 0.0 selects the NaN mode for every extreme operand
    for backend in Backend::ALL {
        let data = Program::new(backend)
            .op(Opcode::MoveTo)
            .doubles(&[0.0; 2])
            .op(Opcode::CurveTo)
            .doubles(&[0.0; 6])
            .op(Opcode::RelCurveTo)
            .doubles(&[0.0; 6])
            .op(Opcode::ArcNegative)
            .doubles(&[0.0; 5])
            .op(Opcode::TransformStep)
            .bytes(&[0])
            .doubles(&[0.0; 2])
            .op(Opcode::TransformStep)
            .bytes(&[1])
            .doubles(&[0.0])
            .op(Opcode::TransformStep)
            .bytes(&[2])
            .doubles(&[0.0; 2])
            .op(Opcode::Transform)
            .doubles(&[0.0; 6])
            .op(Opcode::SetMatrix)
            .doubles(&[0.0; 6])
            .op(Opcode::ClipRect)
            .doubles(&[0.0; 4])
            .op(Opcode::LineTo)
            .doubles(&[0.0; 2])
            .op(Opcode::StrokePreserve)
            .op(Opcode::Fill)
            .op(Opcode::Paint)
            .bytes(&[0])
            .0;
        let report = run_session(&data, &traced()).unwrap();
        assert_eq!(report.stop, StopReason::Exhausted, "{backend:?}");
        assert_eq!(report.ops_executed, 14, "{backend:?}");
        assert_eq!(report.bytes_consumed, data.len(), "{backend:?}");
        assert!(report.resources.is_balanced(), "{backend:?}");
    }
}

#[test]
fn test_unmatched_restore_and_pop_are_skipped() {
    let data = Program::new(Backend::Image)
        .op(Opcode::Restore)
        .op(Opcode::PopGroup)
        .doubles(&[0.5])
        .op(Opcode::PushGroup)
        .bytes(&[0])
        .op(Opcode::Restore)
        .op(Opcode::Save)
        .op(Opcode::PopGroup)
        .doubles(&[0.5])
        .0;
    let report = run_session(&data, &traced()).unwrap();
    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(report.ops_executed, 6);
}

#[test]
fn test_deep_nesting_is_bounded() {
    let mut program = Program::new(Backend::Pdf);
    for _ in 0..100 {
        program = program.op(Opcode::Save).op(Opcode::PushGroup).bytes(&[3]);
    }
    for _ in 0..100 {
        program = program
            .op(Opcode::PopGroup)
            .doubles(&[1.0])
            .op(Opcode::Restore);
    }
    let report = run_session(&program.0, &SessionConfig::default()).unwrap();
    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(report.ops_executed, 400);
}

fn filled_square(seed: u64) -> SessionReport {
    // 6.0-mode doubles (v % 7 == 6) land inside the canvas
    let data = Program::new(Backend::Image)
        .op(Opcode::SourceRgba)
        .doubles(&[0.2, 0.4, 0.6, 1.0])
        .op(Opcode::Rectangle)
        .doubles(&[104.0, 104.0, 300.0, 300.0])
        .op(Opcode::Fill)
        .0;
    let config = SessionConfig {
        seed,
        capture: true,
        ..traced()
    };
    run_session(&data, &config).unwrap()
}

#[test]
fn test_sessions_are_deterministic() {
    let a = filled_square(7);
    let b = filled_square(7);
    assert_eq!(a.trace, b.trace);
    assert_eq!(a.trace, vec![Opcode::SourceRgba, Opcode::Rectangle, Opcode::Fill]);
    assert_eq!(a.ops_executed, b.ops_executed);
    assert!(a.snapshot.is_some());
    assert!(a.snapshot == b.snapshot, "snapshots differ for the same seed");
}

#[test]
fn test_snapshot_shows_drawing() {
    let report = filled_square(1);
    let snapshot = report.snapshot.unwrap();
    let pixel = |x: usize, y: usize| {
        let i = (y * snapshot.width as usize + x) * 4;
        [
            snapshot.rgba[i],
            snapshot.rgba[i + 1],
            snapshot.rgba[i + 2],
            snapshot.rgba[i + 3],
        ]
    };
    // background stays white
    assert_eq!(pixel(10, 10), [255, 255, 255, 255]);
    let [r, g, b, a] = pixel(250, 250);
    assert_eq!(a, 255);
    assert!(r.abs_diff(51) <= 1 && g.abs_diff(102) <= 1 && b.abs_diff(153) <= 1);
}

#[test]
fn test_vector_backends_have_no_snapshot() {
    for backend in [Backend::Pdf, Backend::Svg] {
        let config = SessionConfig {
            capture: true,
            ..SessionConfig::default()
        };
        let report = run_session(&[backend.selector(), Opcode::Paint.byte()], &config).unwrap();
        assert!(report.snapshot.is_none());
    }
}

#[test]
fn test_resource_guards_are_released() {
    let cases = [
        (Opcode::LinearGradient, ResourceKind::Pattern),
        (Opcode::RadialGradient, ResourceKind::Pattern),
        (Opcode::MeshPattern, ResourceKind::Pattern),
        (Opcode::MaskGradient, ResourceKind::Pattern),
        (Opcode::TiledPattern, ResourceKind::Surface),
        (Opcode::TargetAsSource, ResourceKind::Surface),
        (Opcode::ImageStress, ResourceKind::Surface),
        (Opcode::FontFace, ResourceKind::FontFace),
        (Opcode::FontOptions, ResourceKind::FontOptions),
        (Opcode::ScaledFontGlyphs, ResourceKind::ScaledFont),
        (Opcode::ReplayPath, ResourceKind::Path),
        (Opcode::RegionOps, ResourceKind::Region),
    ];
    for backend in Backend::ALL {
        for (opcode, kind) in cases {
            let data = Program::new(backend).op(opcode).bytes(&[0u8; 128]).0;
            let report = run_session(&data, &SessionConfig::default()).unwrap();
            let counts = report.resources;
            assert!(counts.created(kind) >= 1, "{opcode} created no {kind:?}");
            assert_eq!(counts.created(kind), counts.released(kind), "{opcode}");
            assert!(counts.is_balanced(), "{opcode} on {backend:?}: {counts:?}");
        }
    }
}

#[test]
fn test_min_len_is_configurable() {
    let config = SessionConfig {
        min_len: 40,
        ..SessionConfig::default()
    };
    assert!(matches!(
        run_session(&[0u8; 39], &config),
        Err(HarnessError::InputTooShort { len: 39, min: 40 })
    ));
    assert!(run_session(&[0u8; 40], &config).is_ok());
}
