//! Criterion microbenches for NDPA parsing, decoding and encoding.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - NDPA XML parsing (from_ndpa_xml_str, from_ndpa_xml_slice)
//! - record decoding into pixel-space annotations
//! - geometry clean-up and NDPA encoding of a large freehand region

use std::path::Path;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use ndpa::conversion::{decode_ndpa_str, encode_ndpa_string, ConversionOptions, ConversionReport};
use ndpa::ir::io_ndpa_xml::{from_ndpa_xml_slice, from_ndpa_xml_str};
use ndpa::ir::{AnnotationSet, AnnotationShape, Coord, ShapeGeometry};
use ndpa::slide::{CenterOffset, PixelSizeNm, SlideCalibration};
use ndpa::transform::CoordTransform;

// Include test fixtures at compile time (no file I/O during benchmark)
const NDPA_FIXTURE: &str = include_str!("../tests/fixtures/sample.ndpi.ndpa");

fn calibration() -> SlideCalibration {
    SlideCalibration::new(2000, 1000).with_pixel_size_um(0.5, 0.5)
}

fn transform() -> CoordTransform {
    CoordTransform::new(
        PixelSizeNm {
            width: 500.0,
            height: 500.0,
        },
        CenterOffset::new(800.0, 600.0),
    )
}

/// A wobbly closed outline with `n` vertices, the kind of freehand stroke
/// a pathologist draws around a region.
fn freehand_region(n: usize) -> AnnotationSet {
    let points = (0..n)
        .map(|i| {
            let t = std::f64::consts::TAU * i as f64 / n as f64;
            let r = 400.0 + 12.0 * (7.0 * t).sin() + 3.0 * (31.0 * t).cos();
            Coord::new(1000.0 + r * t.cos(), 500.0 + r * t.sin())
        })
        .collect();

    let mut set = AnnotationSet::new();
    set.push(AnnotationShape::new("region", ShapeGeometry::polygon(points)));
    set
}

/// Benchmark NDPA XML parsing from string and bytes.
fn bench_ndpa_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("ndpa_parse");
    group.throughput(Throughput::Bytes(NDPA_FIXTURE.len() as u64));

    group.bench_function("from_ndpa_xml_str", |b| {
        b.iter(|| {
            let records = from_ndpa_xml_str(black_box(NDPA_FIXTURE)).unwrap();
            black_box(records)
        })
    });

    group.bench_function("from_ndpa_xml_slice", |b| {
        b.iter(|| {
            let records = from_ndpa_xml_slice(black_box(NDPA_FIXTURE.as_bytes())).unwrap();
            black_box(records)
        })
    });

    group.finish();
}

/// Benchmark parsing plus decoding into pixel-space annotations.
fn bench_ndpa_decode(c: &mut Criterion) {
    let calibration = calibration();
    let transform = transform();
    let options = ConversionOptions::default();

    let mut group = c.benchmark_group("ndpa_decode");
    group.throughput(Throughput::Bytes(NDPA_FIXTURE.len() as u64));

    group.bench_function("decode_ndpa_str", |b| {
        b.iter(|| {
            let mut report = ConversionReport::new("ndpa", "annotations");
            let shapes = decode_ndpa_str(
                black_box(NDPA_FIXTURE),
                Path::new("<bench>"),
                &transform,
                &calibration,
                None,
                &options,
                &mut report,
            )
            .unwrap();
            black_box(shapes)
        })
    });

    group.finish();
}

/// Benchmark simplification, ring extraction and XML writing.
fn bench_ndpa_encode(c: &mut Criterion) {
    let calibration = calibration();
    let transform = transform();
    let options = ConversionOptions::default();
    let region = freehand_region(2_000);

    let mut group = c.benchmark_group("ndpa_encode");
    group.throughput(Throughput::Elements(2_000));

    group.bench_function("encode_ndpa_string", |b| {
        b.iter(|| {
            let mut report = ConversionReport::new("annotations", "ndpa");
            let xml = encode_ndpa_string(
                black_box(&region),
                &transform,
                &calibration,
                &options,
                &mut report,
            )
            .unwrap();
            black_box(xml)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_ndpa_parse, bench_ndpa_decode, bench_ndpa_encode);
criterion_main!(benches);
