//! Fuzz target for shard reading.
//!
//! This fuzzer feeds arbitrary bytes to the TFRecord frame reader and
//! decodes every payload that passes its checksums as an object record,
//! checking for panics, crashes, or hangs.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use tfshard::record::ObjectRecord;
use tfshard::tfrecord::RecordReader;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    for (index, payload) in RecordReader::new(data).enumerate() {
        let Ok(payload) = payload else {
            break;
        };
        let _ = ObjectRecord::from_bytes(&payload, Path::new("fuzz"), index);
    }

    // Payloads are rarely framed correctly; decode the raw input too.
    let _ = ObjectRecord::from_bytes(data, Path::new("fuzz"), 0);
});
