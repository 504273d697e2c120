//! Fuzz target for the full NDPA import path.
//!
//! Parsed records go through decoding and coordinate transformation, so
//! arbitrary numbers in the file reach the shape builders too.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use ndpa::conversion::{decode_ndpa_str, ConversionOptions, ConversionReport};
use ndpa::slide::{CenterOffset, PixelSizeNm, SlideCalibration};
use ndpa::transform::CoordTransform;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };

    let calibration = SlideCalibration::new(4096, 4096).with_pixel_size_um(0.25, 0.25);
    let transform = CoordTransform::new(
        PixelSizeNm {
            width: 250.0,
            height: 250.0,
        },
        CenterOffset::new(2048.0, 2048.0),
    );
    let options = ConversionOptions {
        rotated: data.len() % 2 == 0,
        ..ConversionOptions::default()
    };
    let mut report = ConversionReport::new("ndpa", "annotations");

    let _ = decode_ndpa_str(
        xml,
        Path::new("<fuzz>"),
        &transform,
        &calibration,
        Some("fuzz"),
        &options,
        &mut report,
    );
});
