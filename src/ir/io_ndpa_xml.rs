//! NDPA XML reader and writer.
//!
//! This adapter handles the annotation files written by Hamamatsu NDP.view:
//! - root `<annotations>` containing `<ndpviewstate>` entries
//! - one `<annotation type="...">` per entry: `circle`, `linearmeasure`,
//!   `pin` or `freehand` (with optional `specialtype="rectangle"`)
//! - all coordinates in nanometres from the slide centre
//!
//! Parsing is per record: a malformed `<ndpviewstate>` yields a
//! [`RecordOutcome::Failed`] and the remaining records are still read. Only
//! a document that is not well-formed XML fails as a whole.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use super::{Coord, Physical};
use crate::error::NdpaError;

/// Value written to `<coordformat>`.
pub const COORD_FORMAT: &str = "nanometers";

/// Lens magnification placeholder NDP.view expects in every record.
pub const DEFAULT_LENS: f64 = 0.445623;

/// One `<ndpviewstate>` element.
#[derive(Clone, Debug, PartialEq)]
pub struct NdpViewState {
    pub id: u64,
    pub title: String,
    pub details: String,
    pub view: ViewSettings,
    pub annotation: NdpaAnnotation,
}

/// Viewer state stored alongside each annotation. Not semantic, but NDP.view
/// refuses records without it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewSettings {
    pub lens: f64,
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub show_title: bool,
    pub show_histogram: bool,
    pub show_line_profile: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            lens: DEFAULT_LENS,
            x: 0,
            y: 0,
            z: 0,
            show_title: false,
            show_histogram: false,
            show_line_profile: false,
        }
    }
}

/// The `<annotation>` element of a record.
#[derive(Clone, Debug, PartialEq)]
pub struct NdpaAnnotation {
    /// Raw `color` attribute, normally `#RRGGBB`.
    pub color: String,
    pub display_name: String,
    pub measure_type: i32,
    pub shape: NdpaShape,
}

/// Shape payload of an annotation, in physical coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum NdpaShape {
    Circle {
        center: Coord<Physical>,
        radius: f64,
    },
    LinearMeasure {
        start: Coord<Physical>,
        end: Coord<Physical>,
    },
    Pin {
        at: Coord<Physical>,
    },
    Freehand {
        points: Vec<Coord<Physical>>,
        /// `specialtype="rectangle"`: a 4-point ring drawn with the
        /// rectangle tool.
        rectangle: bool,
        /// The `<closed>` flag as written in the file.
        closed: bool,
    },
}

impl NdpaShape {
    /// The `type` attribute value for this shape.
    pub fn type_name(&self) -> &'static str {
        match self {
            NdpaShape::Circle { .. } => "circle",
            NdpaShape::LinearMeasure { .. } => "linearmeasure",
            NdpaShape::Pin { .. } => "pin",
            NdpaShape::Freehand { .. } => "freehand",
        }
    }
}

/// Result of parsing one candidate record.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordOutcome {
    Parsed(NdpViewState),
    /// The record's annotation type is not one we read.
    Unsupported { index: usize, type_name: String },
    Failed(RecordError),
}

/// A record that could not be parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordError {
    /// 1-based position among the root's child elements.
    pub index: usize,
    /// The record's `id` attribute, if it had one.
    pub id: Option<String>,
    pub message: String,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "record {} (id {}): {}", self.index, id, self.message),
            None => write!(f, "record {}: {}", self.index, self.message),
        }
    }
}

/// Parse NDPA XML from a string.
pub fn from_ndpa_xml_str(xml: &str) -> Result<Vec<RecordOutcome>, NdpaError> {
    parse_ndpa_xml_str(xml, Path::new("<string>"))
}

/// Parse NDPA XML from bytes (must be valid UTF-8).
pub fn from_ndpa_xml_slice(bytes: &[u8]) -> Result<Vec<RecordOutcome>, NdpaError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| NdpaError::NdpaXmlParse {
        path: PathBuf::from("<bytes>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_ndpa_xml_str(xml, Path::new("<bytes>"))
}

/// Parse NDPA XML read from `path`. The path is only used in error messages.
pub fn parse_ndpa_xml_str(xml: &str, path: &Path) -> Result<Vec<RecordOutcome>, NdpaError> {
    let document = Document::parse(xml).map_err(|source| NdpaError::NdpaXmlParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let root = document.root_element();
    if root.tag_name().name() != "annotations" {
        return Err(NdpaError::NdpaXmlParse {
            path: path.to_path_buf(),
            message: "missing <annotations> root element".to_string(),
        });
    }

    Ok(root
        .children()
        .filter(|n| n.is_element())
        .enumerate()
        .map(|(idx, node)| parse_view_state(node, idx + 1))
        .collect())
}

/// Serialize records to an NDPA XML string.
pub fn to_ndpa_xml_string(records: &[NdpViewState]) -> Result<String, NdpaError> {
    let mut xml = String::new();
    write_document(&mut xml, records).map_err(|_| NdpaError::NdpaWrite {
        path: PathBuf::from("<string>"),
        message: "formatting failed".to_string(),
    })?;
    Ok(xml)
}

fn parse_view_state(node: Node<'_, '_>, index: usize) -> RecordOutcome {
    let raw_id = node.attribute("id").map(str::trim).map(ToOwned::to_owned);
    let fail = |message: String| {
        RecordOutcome::Failed(RecordError {
            index,
            id: raw_id.clone(),
            message,
        })
    };

    let Some(annotation) = descendant(node, "annotation") else {
        return fail("missing <annotation> element".to_string());
    };

    let type_attr = annotation.attribute("type").unwrap_or("").trim();
    let shape = match type_attr.to_ascii_uppercase().as_str() {
        "CIRCLE" => parse_circle(annotation),
        "LINEARMEASURE" => parse_linear_measure(annotation),
        "PIN" => parse_pin(annotation),
        "FREEHAND" => parse_freehand(annotation),
        _ => {
            return RecordOutcome::Unsupported {
                index,
                type_name: type_attr.to_string(),
            }
        }
    };
    let shape = match shape {
        Ok(shape) => shape,
        Err(message) => return fail(message),
    };

    let id = raw_id
        .as_deref()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(index as u64);

    RecordOutcome::Parsed(NdpViewState {
        id,
        title: descendant_text(node, "title").unwrap_or_default(),
        details: descendant_text(node, "details").unwrap_or_default(),
        view: parse_view_settings(node),
        annotation: NdpaAnnotation {
            color: annotation.attribute("color").unwrap_or("").trim().to_string(),
            display_name: annotation
                .attribute("displayname")
                .unwrap_or("")
                .to_string(),
            measure_type: descendant_text(annotation, "measuretype")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(0),
            shape,
        },
    })
}

fn parse_circle(annotation: Node<'_, '_>) -> Result<NdpaShape, String> {
    Ok(NdpaShape::Circle {
        center: Coord::new(
            required_number(annotation, "x")?,
            required_number(annotation, "y")?,
        ),
        radius: required_number(annotation, "radius")?,
    })
}

fn parse_linear_measure(annotation: Node<'_, '_>) -> Result<NdpaShape, String> {
    Ok(NdpaShape::LinearMeasure {
        start: Coord::new(
            required_number(annotation, "x1")?,
            required_number(annotation, "y1")?,
        ),
        end: Coord::new(
            required_number(annotation, "x2")?,
            required_number(annotation, "y2")?,
        ),
    })
}

fn parse_pin(annotation: Node<'_, '_>) -> Result<NdpaShape, String> {
    Ok(NdpaShape::Pin {
        at: Coord::new(
            required_number(annotation, "x")?,
            required_number(annotation, "y")?,
        ),
    })
}

fn parse_freehand(annotation: Node<'_, '_>) -> Result<NdpaShape, String> {
    let pointlist =
        descendant(annotation, "pointlist").ok_or_else(|| "missing <pointlist>".to_string())?;

    let points = pointlist
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "point")
        .enumerate()
        .map(|(i, point)| {
            let x = required_number(point, "x").map_err(|e| format!("point {}: {e}", i + 1))?;
            let y = required_number(point, "y").map_err(|e| format!("point {}: {e}", i + 1))?;
            Ok(Coord::new(x, y))
        })
        .collect::<Result<Vec<_>, String>>()?;

    let rectangle = annotation
        .attribute("specialtype")
        .map(|v| v.trim().eq_ignore_ascii_case("rectangle"))
        .unwrap_or(false);

    let closed = descendant_text(annotation, "closed")
        .map(|raw| raw != "0")
        .unwrap_or(true);

    Ok(NdpaShape::Freehand {
        points,
        rectangle,
        closed,
    })
}

fn parse_view_settings(node: Node<'_, '_>) -> ViewSettings {
    let defaults = ViewSettings::default();
    // <x>/<y> also appear inside the annotation, so only look at direct children.
    let int = |tag: &str, default: i64| {
        child_element(node, tag)
            .and_then(|n| n.text())
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .map(|v| v as i64)
            .unwrap_or(default)
    };
    let flag = |tag: &str| {
        child_element(node, tag)
            .and_then(|n| n.text())
            .map(|raw| raw.trim() == "1")
            .unwrap_or(false)
    };

    ViewSettings {
        lens: child_element(node, "lens")
            .and_then(|n| n.text())
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(defaults.lens),
        x: int("x", defaults.x),
        y: int("y", defaults.y),
        z: int("z", defaults.z),
        show_title: flag("showtitle"),
        show_histogram: flag("showhistogram"),
        show_line_profile: flag("showlineprofile"),
    }
}

fn write_document(xml: &mut String, records: &[NdpViewState]) -> fmt::Result {
    writeln!(
        xml,
        "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\"?>"
    )?;
    writeln!(xml, "<annotations>")?;
    for record in records {
        write_view_state(xml, record)?;
    }
    writeln!(xml, "</annotations>")
}

fn write_view_state(xml: &mut String, record: &NdpViewState) -> fmt::Result {
    let view = &record.view;
    let annotation = &record.annotation;

    writeln!(xml, "  <ndpviewstate id=\"{}\">", record.id)?;
    writeln!(xml, "    <title>{}</title>", xml_escape(&record.title))?;
    writeln!(xml, "    <details>{}</details>", xml_escape(&record.details))?;
    writeln!(xml, "    <coordformat>{COORD_FORMAT}</coordformat>")?;
    writeln!(xml, "    <lens>{}</lens>", view.lens)?;
    writeln!(xml, "    <x>{}</x>", view.x)?;
    writeln!(xml, "    <y>{}</y>", view.y)?;
    writeln!(xml, "    <z>{}</z>", view.z)?;
    writeln!(xml, "    <showtitle>{}</showtitle>", u8::from(view.show_title))?;
    writeln!(
        xml,
        "    <showhistogram>{}</showhistogram>",
        u8::from(view.show_histogram)
    )?;
    writeln!(
        xml,
        "    <showlineprofile>{}</showlineprofile>",
        u8::from(view.show_line_profile)
    )?;

    let special = match &annotation.shape {
        NdpaShape::Freehand {
            rectangle: true, ..
        } => " specialtype=\"rectangle\"",
        _ => "",
    };
    writeln!(
        xml,
        "    <annotation type=\"{}\" displayname=\"{}\" color=\"{}\"{}>",
        annotation.shape.type_name(),
        xml_escape(&annotation.display_name),
        xml_escape(&annotation.color),
        special
    )?;
    writeln!(
        xml,
        "      <measuretype>{}</measuretype>",
        annotation.measure_type
    )?;

    match &annotation.shape {
        NdpaShape::Circle { center, radius } => {
            writeln!(xml, "      <x>{}</x>", nm(center.x))?;
            writeln!(xml, "      <y>{}</y>", nm(center.y))?;
            writeln!(xml, "      <radius>{}</radius>", nm(*radius))?;
        }
        NdpaShape::LinearMeasure { start, end } => {
            writeln!(xml, "      <x1>{}</x1>", nm(start.x))?;
            writeln!(xml, "      <y1>{}</y1>", nm(start.y))?;
            writeln!(xml, "      <x2>{}</x2>", nm(end.x))?;
            writeln!(xml, "      <y2>{}</y2>", nm(end.y))?;
        }
        NdpaShape::Pin { at } => {
            writeln!(xml, "      <x>{}</x>", nm(at.x))?;
            writeln!(xml, "      <y>{}</y>", nm(at.y))?;
        }
        NdpaShape::Freehand { points, closed, .. } => {
            writeln!(xml, "      <closed>{}</closed>", u8::from(*closed))?;
            writeln!(xml, "      <pointlist>")?;
            for point in points {
                writeln!(xml, "        <point>")?;
                writeln!(xml, "          <x>{}</x>", nm(point.x))?;
                writeln!(xml, "          <y>{}</y>", nm(point.y))?;
                writeln!(xml, "        </point>")?;
            }
            writeln!(xml, "      </pointlist>")?;
        }
    }

    writeln!(xml, "    </annotation>")?;
    writeln!(xml, "  </ndpviewstate>")
}

/// Formats a nanometre value, without a fraction when it is whole.
fn nm(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn descendant<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn descendant_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    descendant(node, tag).map(|n| {
        n.descendants()
            .filter(|d| d.is_text())
            .filter_map(|d| d.text())
            .collect::<String>()
            .trim()
            .to_string()
    })
}

fn required_number(node: Node<'_, '_>, tag: &str) -> Result<f64, String> {
    let raw = descendant_text(node, tag).ok_or_else(|| format!("missing <{tag}>"))?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("invalid <{tag}> value '{raw}'; expected a number")),
    }
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
