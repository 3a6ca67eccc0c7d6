//! Fuzz target for LabelMe JSON parsing.
//!
//! Feeds arbitrary bytes to the LabelMe decoder and, when decoding
//! succeeds, serializes the result back out as a crop document.
//!
//! Run with:
//!   cargo +nightly fuzz run labelme_json_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelcrop::ir::io_labelme::fuzz_roundtrip;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for a single annotation file.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_roundtrip(data);
});
