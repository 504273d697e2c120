//! Pixel-space annotations → NDPA records.

use tracing::{debug, warn};

use super::{ConversionIssue, ConversionIssueCode, ConversionOptions, ConversionReport};
use crate::error::NdpaError;
use crate::geometry::{shape_rings, SkipReason};
use crate::ir::io_ndpa_xml::{to_ndpa_xml_string, NdpViewState, NdpaAnnotation, NdpaShape, ViewSettings};
use crate::ir::{AnnotationSet, AnnotationShape, Color};
use crate::slide::SlideCalibration;
use crate::transform::CoordTransform;

/// Title and details written for hole rings.
pub const CLEAR_TITLE: &str = "clear";

/// Color written for hole rings.
pub const CLEAR_COLOR: Color = Color::BLACK;

const FREEHAND_DISPLAY_NAME: &str = "AnnotateFreehand";

/// Encodes annotations and serializes them to a complete NDPA document.
pub fn encode_ndpa_string(
    annotations: &AnnotationSet,
    transform: &CoordTransform,
    calibration: &SlideCalibration,
    options: &ConversionOptions,
    report: &mut ConversionReport,
) -> Result<String, NdpaError> {
    let records = encode_annotations(annotations, transform, calibration, options, report);
    to_ndpa_xml_string(&records)
}

/// Converts every exportable annotation to closed freehand records.
///
/// Record ids run from 1 across the whole output. Each polygon's exterior
/// ring carries the annotation's name, details and color; every hole ring
/// becomes a separate `clear` record.
pub fn encode_annotations(
    annotations: &AnnotationSet,
    transform: &CoordTransform,
    calibration: &SlideCalibration,
    options: &ConversionOptions,
    report: &mut ConversionReport,
) -> Vec<NdpViewState> {
    report.input.annotations += annotations.len();

    let center = calibration.image_center();
    let view = ViewSettings {
        x: center.x as i64,
        y: center.y as i64,
        ..ViewSettings::default()
    };

    let mut records = Vec::new();
    let mut hole_records = 0usize;

    for (position, shape) in annotations.iter().enumerate() {
        let rings = match shape_rings(&shape.geometry, options) {
            Ok(rings) => rings,
            Err(reason) => {
                report_skip(report, position + 1, shape, reason);
                continue;
            }
        };

        let details = export_details(shape);
        let color = shape.display_color().to_string();

        for ring in rings {
            let (title, details, color) = if ring.is_exterior() {
                (shape.name.clone(), details.clone(), color.clone())
            } else {
                hole_records += 1;
                (
                    CLEAR_TITLE.to_string(),
                    CLEAR_TITLE.to_string(),
                    CLEAR_COLOR.to_string(),
                )
            };

            records.push(NdpViewState {
                id: records.len() as u64 + 1,
                title,
                details,
                view,
                annotation: NdpaAnnotation {
                    color,
                    display_name: FREEHAND_DISPLAY_NAME.to_string(),
                    measure_type: 0,
                    shape: NdpaShape::Freehand {
                        points: ring
                            .points
                            .into_iter()
                            .map(|p| transform.to_physical(p))
                            .collect(),
                        rectangle: false,
                        closed: true,
                    },
                },
            });
        }
        debug!(annotation = position + 1, records = records.len(), "encoded annotation");
    }

    if hole_records > 0 {
        report.add(ConversionIssue::info(
            ConversionIssueCode::InteriorRingsAsClearRecords,
            format!("{hole_records} hole ring(s) written as separate '{CLEAR_TITLE}' records"),
        ));
    }

    report.output.records += records.len();
    records
}

/// The `<details>` text: the classification when set, else the description.
fn export_details(shape: &AnnotationShape) -> String {
    match &shape.classification {
        Some(class) => class.clone(),
        None => shape.description.clone(),
    }
}

fn report_skip(
    report: &mut ConversionReport,
    position: usize,
    shape: &AnnotationShape,
    reason: SkipReason,
) {
    let label = if shape.name.is_empty() {
        format!("annotation {position}")
    } else {
        format!("annotation {position} ('{}')", shape.name)
    };

    let issue = match reason {
        SkipReason::NoArea(kind) => ConversionIssue::warning(
            ConversionIssueCode::NonAreaShapeSkipped,
            format!("{label}: {kind} annotations have no area and are not exported"),
        ),
        SkipReason::NonFinite => ConversionIssue::warning(
            ConversionIssueCode::NonFiniteGeometrySkipped,
            format!("{label}: geometry has non-finite coordinates"),
        ),
        SkipReason::Empty => ConversionIssue::warning(
            ConversionIssueCode::EmptyGeometrySkipped,
            format!("{label}: nothing left after simplification and small-area removal"),
        ),
    };
    warn!(reason = issue.message.as_str(), "annotation not exported");
    report.add(issue);
}
