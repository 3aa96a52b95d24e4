#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Findings are crashes inside cairo; the return value carries nothing.
    cairo_fuzz::fuzz_one_input(data);
});
