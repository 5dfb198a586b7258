#![no_main]

use libfuzzer_sys::fuzz_target;
use trackread_core::hexdump::{BYTES_PER_LINE, render};

fuzz_target!(|data: &[u8]| {
    let out = render(data);
    assert_eq!(out.lines().count(), data.len().div_ceil(BYTES_PER_LINE));
    assert!(out.is_ascii());
});
