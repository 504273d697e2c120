#![allow(dead_code)]

use ndpa::ir::{Coord, Pixel};
use ndpa::slide::{CenterOffset, PixelSizeNm};
use ndpa::transform::CoordTransform;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Largest physical coordinate used in generated data, in nm (±25 mm, the
/// half-width of a standard glass slide).
pub const MAX_PHYSICAL_NM: i64 = 25_000_000;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Pixel sizes between 100 nm and 2 µm, independent per axis.
pub fn arb_pixel_size() -> BoxedStrategy<PixelSizeNm> {
    (100.0f64..2000.0, 100.0f64..2000.0)
        .prop_map(|(width, height)| PixelSizeNm { width, height })
        .boxed()
}

pub fn arb_offset() -> BoxedStrategy<CenterOffset> {
    (-50_000.0f64..150_000.0, -50_000.0f64..150_000.0)
        .prop_map(|(x, y)| CenterOffset::new(x, y))
        .boxed()
}

pub fn arb_transform() -> BoxedStrategy<CoordTransform> {
    (arb_pixel_size(), arb_offset())
        .prop_map(|(size, offset)| CoordTransform::new(size, offset))
        .boxed()
}

pub fn arb_physical_nm() -> BoxedStrategy<i64> {
    (-MAX_PHYSICAL_NM..=MAX_PHYSICAL_NM).boxed()
}

/// An axis-aligned rectangle `(x0, y0, width, height)` in pixels, large
/// enough to survive simplification and small-fragment removal.
pub fn arb_rect() -> BoxedStrategy<(f64, f64, f64, f64)> {
    (
        0.0f64..50_000.0,
        0.0f64..50_000.0,
        30.0f64..5_000.0,
        30.0f64..5_000.0,
    )
        .boxed()
}

pub fn rect_ring(x0: f64, y0: f64, width: f64, height: f64) -> Vec<Coord<Pixel>> {
    vec![
        Coord::new(x0, y0),
        Coord::new(x0 + width, y0),
        Coord::new(x0 + width, y0 + height),
        Coord::new(x0, y0 + height),
    ]
}

/// Largest pixel error one whole-nanometre truncation can introduce.
pub fn truncation_eps(size: PixelSizeNm) -> f64 {
    // One nm in pixels, plus slack for float rounding in the offset.
    (1.0 / size.width).max(1.0 / size.height) + 1e-6
}
