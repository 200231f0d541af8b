//! Fuzz target for annotation line parsing.
//!
//! This fuzzer feeds arbitrary UTF-8 lines to the JSON-lines annotation
//! parser and converts whatever parses into a box, checking for panics,
//! crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tfshard::annotation::{Annotation, BboxUnits};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(annotation) = Annotation::from_json_line(line) {
        let _ = BboxUnits::Pixel.normalize(annotation.corners(), 640, 480);
    }
});
