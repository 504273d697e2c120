//! Integration tests for importing NDPA files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ndpa::conversion::ConversionIssueCode;
use ndpa::ir::{AnnotationSet, AnnotationShape, Color, Coord, ShapeGeometry, ShapeKind};
use ndpa::session::NdpaSession;
use ndpa::slide::{read_slide_info, NoMetadata, SlideCalibration, X_OFFSET_PROPERTY};
use ndpa::NdpaError;

mod common;

#[test]
fn imports_every_supported_record_type() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_fixture_ndpa(temp.path());
    let session = common::sample_session(temp.path());

    let mut target = AnnotationSet::new();
    let report = session.import(&mut target, None).expect("import");

    assert_eq!(report.input.records, 6);
    assert_eq!(report.output.annotations, 5);
    assert_eq!(report.failed_records(), 0);
    assert_eq!(
        report.count(ConversionIssueCode::UnsupportedAnnotationType),
        1
    );

    let kinds: Vec<ShapeKind> = target.iter().map(AnnotationShape::kind).collect();
    assert_eq!(
        kinds,
        vec![
            ShapeKind::Circle,
            ShapeKind::Line,
            ShapeKind::Point,
            ShapeKind::Rectangle,
            ShapeKind::Polygon,
        ]
    );
    assert!(target.iter().all(|shape| shape.locked));
}

#[test]
fn coordinates_are_placed_relative_to_the_corrected_centre() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_fixture_ndpa(temp.path());
    let session = common::sample_session(temp.path());

    let mut target = AnnotationSet::new();
    session.import(&mut target, None).expect("import");
    let shapes = &target.annotations;

    assert_eq!(
        shapes[0].geometry,
        ShapeGeometry::Circle {
            center: Coord::new(800.0, 600.0),
            radius_x: 20.0,
            radius_y: 20.0,
        }
    );
    assert_eq!(
        shapes[1].geometry,
        ShapeGeometry::Line {
            start: Coord::new(790.0, 600.0),
            end: Coord::new(810.0, 600.0),
        }
    );
    assert_eq!(
        shapes[2].geometry,
        ShapeGeometry::Point {
            at: Coord::new(820.0, 620.0)
        }
    );
    assert_eq!(
        shapes[3].geometry,
        ShapeGeometry::Rectangle {
            corner: Coord::new(780.0, 580.0),
            opposite: Coord::new(820.0, 620.0),
        }
    );
    assert_eq!(
        shapes[4].geometry,
        ShapeGeometry::polygon(vec![
            Coord::new(800.0, 600.0),
            Coord::new(840.0, 600.0),
            Coord::new(800.0, 640.0),
        ])
    );
}

#[test]
fn circle_bounding_box_is_twice_the_radius() {
    let temp = tempfile::tempdir().expect("create temp dir");
    fs::write(
        temp.path().join("c.ndpi.ndpa"),
        r##"<annotations><ndpviewstate id="1">
  <annotation type="circle" color="#ff0000"><x>0</x><y>0</y><radius>37</radius></annotation>
</ndpviewstate></annotations>"##,
    )
    .expect("write ndpa");

    // 1 nm pixels and an offset of zero.
    let calibration = SlideCalibration::new(0, 0).with_pixel_size_um(0.001, 0.001);
    let session = NdpaSession::new(
        temp.path().join("c.ndpi"),
        calibration,
        BTreeMap::<String, String>::new(),
    );

    let mut target = AnnotationSet::new();
    session.import(&mut target, None).expect("import");

    let (min, max) = target.annotations[0].geometry.bounds().expect("bounds");
    assert_eq!(max.x - min.x, 74.0);
    assert_eq!(max.y - min.y, 74.0);
}

#[test]
fn names_colors_and_details_are_carried_over() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_fixture_ndpa(temp.path());
    let session = common::sample_session(temp.path());

    let mut target = AnnotationSet::new();
    session
        .import(&mut target, Some("Tumor"))
        .expect("import");

    let circle = &target.annotations[0];
    assert_eq!(circle.name, "nucleus");
    assert_eq!(circle.description, "round");
    assert_eq!(circle.color, Some(Color::rgb(255, 0, 0)));

    assert_eq!(target.annotations[2].color, Some(Color::rgb(0, 0, 255)));
    assert_eq!(target.annotations[4].description, "grade 2");
    assert!(target.annotations[1].description.is_empty());
    assert!(target
        .iter()
        .all(|shape| shape.classification.as_deref() == Some("Tumor")));
}

#[test]
fn import_appends_to_existing_annotations() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_fixture_ndpa(temp.path());
    let session = common::sample_session(temp.path());

    let mut target = AnnotationSet::new();
    target.push(AnnotationShape::new(
        "existing",
        ShapeGeometry::Point {
            at: Coord::new(1.0, 1.0),
        },
    ));
    session.import(&mut target, None).expect("import");

    assert_eq!(target.len(), 6);
    assert_eq!(target.annotations[0].name, "existing");
}

#[test]
fn one_malformed_record_out_of_three() {
    let temp = tempfile::tempdir().expect("create temp dir");
    fs::write(
        temp.path().join("sample.ndpi.ndpa"),
        r##"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<annotations>
  <ndpviewstate id="1">
    <annotation type="pin" color="#ff0000"><x>0</x><y>0</y></annotation>
  </ndpviewstate>
  <ndpviewstate id="2">
    <annotation type="circle" color="#ff0000"><x>0</x><y>0</y><radius>abc</radius></annotation>
  </ndpviewstate>
  <ndpviewstate id="3">
    <annotation type="linearmeasure" color="#ff0000"><x1>0</x1><y1>0</y1><x2>500</x2><y2>500</y2></annotation>
  </ndpviewstate>
</annotations>"##,
    )
    .expect("write ndpa");
    let session = common::sample_session(temp.path());

    let mut target = AnnotationSet::new();
    let report = session.import(&mut target, None).expect("import");

    assert_eq!(target.len(), 2);
    assert_eq!(report.failed_records(), 1);
    assert!(report
        .warning_messages()
        .any(|message| message.contains("<radius>")));
}

#[test]
fn missing_calibration_fails_without_adding_shapes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_fixture_ndpa(temp.path());
    let session = NdpaSession::new(
        common::slide_path(temp.path()),
        SlideCalibration::new(2000, 1000),
        common::sample_properties(),
    );

    let mut target = AnnotationSet::new();
    let err = session.import(&mut target, None).unwrap_err();

    assert!(err.is_precondition());
    assert!(target.is_empty());
}

#[test]
fn wrong_slide_type_fails_without_adding_shapes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    fs::write(temp.path().join("sample.svs.ndpa"), common::FIXTURE_NDPA).expect("write ndpa");
    let session = NdpaSession::new(
        temp.path().join("sample.svs"),
        common::sample_calibration(),
        common::sample_properties(),
    );

    let mut target = AnnotationSet::new();
    assert!(session
        .import(&mut target, None)
        .unwrap_err()
        .is_precondition());
    assert!(target.is_empty());
}

#[test]
fn malformed_document_is_fatal_and_adds_nothing() {
    let temp = tempfile::tempdir().expect("create temp dir");
    fs::write(
        temp.path().join("sample.ndpi.ndpa"),
        "<annotations><ndpviewstate id=\"1\">",
    )
    .expect("write ndpa");
    let session = common::sample_session(temp.path());

    let mut target = AnnotationSet::new();
    match session.import(&mut target, None) {
        Err(NdpaError::NdpaXmlParse { path, .. }) => {
            assert_eq!(path, temp.path().join("sample.ndpi.ndpa"))
        }
        other => panic!("expected NdpaXmlParse, got {other:?}"),
    }
    assert!(target.is_empty());
}

#[test]
fn unavailable_metadata_falls_back_to_image_centre() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_fixture_ndpa(temp.path());
    let session = NdpaSession::new(
        common::slide_path(temp.path()),
        common::sample_calibration(),
        NoMetadata,
    );

    let mut target = AnnotationSet::new();
    let report = session.import(&mut target, None).expect("import");

    assert_eq!(report.count(ConversionIssueCode::MetadataUnavailable), 1);
    match &target.annotations[0].geometry {
        ShapeGeometry::Circle { center, .. } => assert_eq!(*center, Coord::new(1000.0, 500.0)),
        other => panic!("expected circle, got {other:?}"),
    }
}

#[test]
fn each_offset_axis_is_corrected_independently() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_fixture_ndpa(temp.path());
    let properties = BTreeMap::from([(X_OFFSET_PROPERTY.to_string(), "100000".to_string())]);
    let session = NdpaSession::new(
        common::slide_path(temp.path()),
        common::sample_calibration(),
        properties,
    );

    let mut target = AnnotationSet::new();
    let report = session.import(&mut target, None).expect("import");

    assert_eq!(report.count(ConversionIssueCode::OffsetPropertyMissing), 1);
    assert_eq!(report.warning_count(), 0);
    match &target.annotations[0].geometry {
        ShapeGeometry::Circle { center, .. } => assert_eq!(*center, Coord::new(800.0, 500.0)),
        other => panic!("expected circle, got {other:?}"),
    }
}

#[test]
fn slide_info_files_drive_the_session() {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let json = read_slide_info(&fixtures.join("sample.ndpi.json")).expect("read json info");
    let yaml = read_slide_info(&fixtures.join("sample.ndpi.yaml")).expect("read yaml info");

    assert_eq!(json.calibration(), common::sample_calibration());
    assert_eq!(yaml.calibration(), json.calibration());

    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_fixture_ndpa(temp.path());
    let session = NdpaSession::new(common::slide_path(temp.path()), yaml.calibration(), yaml);

    let mut target = AnnotationSet::new();
    session.import(&mut target, None).expect("import");
    assert_eq!(
        target.annotations[2].geometry,
        ShapeGeometry::Point {
            at: Coord::new(820.0, 620.0)
        }
    );
}
