//! Fuzz target for NDPA XML parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the NDPA XML parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ndpa::ir::io_ndpa_xml::from_ndpa_xml_slice;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_ndpa_xml_slice(data);
});
