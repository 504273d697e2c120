#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ndpa::ir::{Coord, Pixel};
use ndpa::session::NdpaSession;
use ndpa::slide::{SlideCalibration, X_OFFSET_PROPERTY, Y_OFFSET_PROPERTY};

pub const FIXTURE_NDPA: &str = include_str!("../fixtures/sample.ndpi.ndpa");

/// Calibration matching `tests/fixtures/sample.ndpi.json`: 2000×1000 px at
/// 500 nm per pixel.
pub fn sample_calibration() -> SlideCalibration {
    SlideCalibration::new(2000, 1000).with_pixel_size_um(0.5, 0.5)
}

/// Properties matching `tests/fixtures/sample.ndpi.json`. With the sample
/// calibration they put the NDPA origin at pixel (800, 600).
pub fn sample_properties() -> BTreeMap<String, String> {
    BTreeMap::from([
        (X_OFFSET_PROPERTY.to_string(), "100000".to_string()),
        (Y_OFFSET_PROPERTY.to_string(), "-50000".to_string()),
    ])
}

pub fn slide_path(dir: &Path) -> PathBuf {
    dir.join("sample.ndpi")
}

pub fn sample_session(dir: &Path) -> NdpaSession<BTreeMap<String, String>> {
    NdpaSession::new(slide_path(dir), sample_calibration(), sample_properties())
}

/// Writes the fixture NDPA file next to `<dir>/sample.ndpi`.
pub fn write_fixture_ndpa(dir: &Path) -> PathBuf {
    let path = dir.join("sample.ndpi.ndpa");
    fs::write(&path, FIXTURE_NDPA).expect("write fixture ndpa");
    path
}

pub fn square(x0: f64, y0: f64, size: f64) -> Vec<Coord<Pixel>> {
    vec![
        Coord::new(x0, y0),
        Coord::new(x0 + size, y0),
        Coord::new(x0 + size, y0 + size),
        Coord::new(x0, y0 + size),
    ]
}

pub fn assert_close(actual: Coord<Pixel>, expected: Coord<Pixel>, eps: f64) {
    assert!(
        (actual.x - expected.x).abs() <= eps && (actual.y - expected.y).abs() <= eps,
        "expected {expected:?} within {eps}, got {actual:?}"
    );
}
