#![no_main]

use libfuzzer_sys::fuzz_target;

use compiler::Diagnostics;

// Any byte soup must produce either an extraction or an error, never a
// panic or an out-of-bounds read.
fuzz_target!(|data: &[u8]| {
    let mut diag = Diagnostics::default();
    let _ = compiler::extract(data.to_vec(), &mut diag);
});
