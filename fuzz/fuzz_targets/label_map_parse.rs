//! Fuzz target for label map descriptor parsing.
//!
//! This fuzzer feeds arbitrary UTF-8 text to the `.pbtxt` parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tfshard::labels::pbtxt::from_pbtxt_str;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = from_pbtxt_str(text);
});
