//! NDPA records → pixel-space annotations.

use std::path::Path;

use tracing::{debug, warn};

use super::{ConversionIssue, ConversionIssueCode, ConversionOptions, ConversionReport};
use crate::error::NdpaError;
use crate::ir::io_ndpa_xml::{parse_ndpa_xml_str, NdpViewState, NdpaShape, RecordError, RecordOutcome};
use crate::ir::{AnnotationShape, Color, Coord, Physical, ShapeGeometry};
use crate::slide::SlideCalibration;
use crate::transform::CoordTransform;

/// Parses an NDPA document and converts every readable record.
///
/// Fails only when the document itself is not well-formed. Malformed
/// records are skipped and reported.
pub fn decode_ndpa_str(
    xml: &str,
    path: &Path,
    transform: &CoordTransform,
    calibration: &SlideCalibration,
    classification: Option<&str>,
    options: &ConversionOptions,
    report: &mut ConversionReport,
) -> Result<Vec<AnnotationShape>, NdpaError> {
    let outcomes = parse_ndpa_xml_str(xml, path)?;
    Ok(decode_records(
        outcomes,
        transform,
        calibration,
        classification,
        options,
        report,
    ))
}

/// Converts parsed records to locked, pixel-space annotations.
///
/// `outcomes` must be in document order, one per child element of the root,
/// as returned by [`parse_ndpa_xml_str`].
pub fn decode_records(
    outcomes: Vec<RecordOutcome>,
    transform: &CoordTransform,
    calibration: &SlideCalibration,
    classification: Option<&str>,
    options: &ConversionOptions,
    report: &mut ConversionReport,
) -> Vec<AnnotationShape> {
    report.input.records += outcomes.len();

    let mut shapes = Vec::with_capacity(outcomes.len());
    for (position, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            RecordOutcome::Parsed(state) => {
                let id = state.id;
                match to_shape(state, transform, calibration, options, report) {
                    Ok(mut shape) => {
                        if let Some(class) = classification {
                            shape.classification = Some(class.to_string());
                        }
                        debug!(id, kind = %shape.kind(), name = %shape.name, "imported record");
                        shapes.push(shape);
                    }
                    Err(message) => record_failed(
                        report,
                        RecordError {
                            index: position + 1,
                            id: Some(id.to_string()),
                            message,
                        },
                    ),
                }
            }
            RecordOutcome::Unsupported { index, type_name } => {
                debug!(index, type_name = type_name.as_str(), "skipping unsupported record");
                report.add(ConversionIssue::info(
                    ConversionIssueCode::UnsupportedAnnotationType,
                    format!("record {index}: annotation type '{type_name}' is not imported"),
                ));
            }
            RecordOutcome::Failed(err) => record_failed(report, err),
        }
    }

    report.output.annotations += shapes.len();
    shapes
}

fn record_failed(report: &mut ConversionReport, err: RecordError) {
    warn!(%err, "skipping malformed NDPA record");
    report.add(ConversionIssue::warning(
        ConversionIssueCode::RecordParseFailed,
        err.to_string(),
    ));
}

fn to_shape(
    state: NdpViewState,
    transform: &CoordTransform,
    calibration: &SlideCalibration,
    options: &ConversionOptions,
    report: &mut ConversionReport,
) -> Result<AnnotationShape, String> {
    let geometry = match state.annotation.shape {
        NdpaShape::Circle { center, radius } => {
            let (radius_x, radius_y) = transform.length_to_pixels(radius);
            ShapeGeometry::Circle {
                center: transform.to_pixel(center),
                radius_x,
                radius_y,
            }
        }
        NdpaShape::LinearMeasure { start, end } => ShapeGeometry::Line {
            start: transform.to_pixel(start),
            end: transform.to_pixel(end),
        },
        NdpaShape::Pin { at } => ShapeGeometry::Point {
            at: transform.to_pixel(at),
        },
        NdpaShape::Freehand {
            points, rectangle, ..
        } => {
            if points.is_empty() {
                return Err("freehand annotation has an empty <pointlist>".to_string());
            }
            let points: Vec<_> = points
                .into_iter()
                .map(|p| {
                    let p = if options.rotated {
                        Coord::<Physical>::new(p.x, calibration.height as f64 - p.y)
                    } else {
                        p
                    };
                    transform.to_pixel(p)
                })
                .collect();

            // Files mark open paths with <closed>0</closed>, but NDP.view draws
            // every freehand annotation closed, so the flag is not consulted.
            if rectangle {
                if points.len() < 3 {
                    return Err(format!(
                        "rectangle needs at least 3 points, found {}",
                        points.len()
                    ));
                }
                ShapeGeometry::Rectangle {
                    corner: points[0],
                    opposite: points[2],
                }
            } else {
                ShapeGeometry::polygon(points)
            }
        }
    };

    let color = match state.annotation.color.parse::<Color>() {
        Ok(color) => Some(color),
        Err(err) => {
            report.add(ConversionIssue::info(
                ConversionIssueCode::InvalidColor,
                format!("record with id {}: {err}; using the default color", state.id),
            ));
            None
        }
    };

    let mut shape = AnnotationShape::new(state.title, geometry).locked();
    shape.description = state.details;
    shape.color = color;
    Ok(shape)
}
