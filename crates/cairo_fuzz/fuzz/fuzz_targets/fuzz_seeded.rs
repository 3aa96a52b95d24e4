#![no_main]

use arbitrary::Arbitrary;
use cairo_fuzz::{run_session, SessionConfig};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    seed: u64,
    max_ops: u16,
    program: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let config = SessionConfig {
        seed: input.seed,
        max_ops: (input.max_ops as usize).clamp(1, cairo_fuzz::DEFAULT_MAX_OPS),
        ..SessionConfig::default()
    };
    let Ok(report) = run_session(&input.program, &config) else {
        return;
    };

    // Every guard the session created must have been dropped
    assert!(report.resources.is_balanced(), "{:?}", report.resources);
    assert!(report.ops_executed <= config.max_ops);
    assert!(report.bytes_consumed <= input.program.len());
});
