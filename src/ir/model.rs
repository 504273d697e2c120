//! In-memory annotation model.
//!
//! This is the viewer-side representation of slide annotations: named,
//! classified, colored regions whose geometry lives in image-pixel space.
//! The NDPA reader produces these, and the NDPA writer consumes them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::color::Color;
use super::coord::Coord;
use super::space::Pixel;

/// An ordered collection of annotations belonging to one slide.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnnotationSet {
    /// Annotations in display/export order.
    #[serde(default)]
    pub annotations: Vec<AnnotationShape>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn push(&mut self, annotation: AnnotationShape) {
        self.annotations.push(annotation);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnnotationShape> {
        self.annotations.iter()
    }
}

impl Extend<AnnotationShape> for AnnotationSet {
    fn extend<T: IntoIterator<Item = AnnotationShape>>(&mut self, iter: T) {
        self.annotations.extend(iter);
    }
}

/// One annotated region.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnotationShape {
    /// Display label; may be empty.
    #[serde(default)]
    pub name: String,

    /// Free-text detail field; may be empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Display color. `None` means "use the viewer default".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,

    /// Shape geometry in pixel space.
    pub geometry: ShapeGeometry,

    /// Imported annotations are always locked.
    #[serde(default)]
    pub locked: bool,

    /// Optional category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
}

impl AnnotationShape {
    /// Creates an unlocked, unclassified annotation with the given geometry.
    pub fn new(name: impl Into<String>, geometry: ShapeGeometry) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            color: None,
            geometry,
            locked: false,
            classification: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    /// The color the viewer would display for this annotation.
    pub fn display_color(&self) -> Color {
        self.color.unwrap_or(Color::DEFAULT_ANNOTATION)
    }
}

/// Variant tag for [`ShapeGeometry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Circle,
    Line,
    Point,
    Polygon,
    Polyline,
    Rectangle,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Line => "line",
            ShapeKind::Point => "point",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Polyline => "polyline",
            ShapeKind::Rectangle => "rectangle",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pixel-space geometry of an annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeGeometry {
    /// An axis-aligned ellipse. NDPA circles become ellipses in pixel space
    /// whenever the pixel size differs between axes.
    Circle {
        center: Coord<Pixel>,
        radius_x: f64,
        radius_y: f64,
    },
    Line {
        start: Coord<Pixel>,
        end: Coord<Pixel>,
    },
    Point {
        at: Coord<Pixel>,
    },
    /// A closed region made of one or more parts, each possibly with holes.
    Polygon { parts: Vec<PolygonPart> },
    /// An open path.
    Polyline { points: Vec<Coord<Pixel>> },
    /// An axis-aligned rectangle given by two opposite corners.
    Rectangle {
        corner: Coord<Pixel>,
        opposite: Coord<Pixel>,
    },
}

impl ShapeGeometry {
    /// A single-part polygon without holes.
    pub fn polygon(exterior: Vec<Coord<Pixel>>) -> Self {
        ShapeGeometry::Polygon {
            parts: vec![PolygonPart::new(exterior)],
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeGeometry::Circle { .. } => ShapeKind::Circle,
            ShapeGeometry::Line { .. } => ShapeKind::Line,
            ShapeGeometry::Point { .. } => ShapeKind::Point,
            ShapeGeometry::Polygon { .. } => ShapeKind::Polygon,
            ShapeGeometry::Polyline { .. } => ShapeKind::Polyline,
            ShapeGeometry::Rectangle { .. } => ShapeKind::Rectangle,
        }
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for empty geometry.
    pub fn bounds(&self) -> Option<(Coord<Pixel>, Coord<Pixel>)> {
        let points: Vec<Coord<Pixel>> = match self {
            ShapeGeometry::Circle {
                center,
                radius_x,
                radius_y,
            } => vec![
                Coord::new(center.x - radius_x.abs(), center.y - radius_y.abs()),
                Coord::new(center.x + radius_x.abs(), center.y + radius_y.abs()),
            ],
            ShapeGeometry::Line { start, end } => vec![*start, *end],
            ShapeGeometry::Point { at } => vec![*at],
            ShapeGeometry::Polygon { parts } => parts
                .iter()
                .flat_map(|part| part.exterior.iter().copied())
                .collect(),
            ShapeGeometry::Polyline { points } => points.clone(),
            ShapeGeometry::Rectangle { corner, opposite } => vec![*corner, *opposite],
        };

        let first = points.first()?;
        let init = (*first, *first);
        Some(points.iter().fold(init, |(min, max), p| {
            (
                Coord::new(min.x.min(p.x), min.y.min(p.y)),
                Coord::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }
}

/// One simply-connected part of a polygon: an exterior ring plus holes.
///
/// Rings are stored open (the closing point is implied).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonPart {
    pub exterior: Vec<Coord<Pixel>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Coord<Pixel>>>,
}

impl PolygonPart {
    pub fn new(exterior: Vec<Coord<Pixel>>) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
        }
    }

    pub fn with_hole(mut self, hole: Vec<Coord<Pixel>>) -> Self {
        self.holes.push(hole);
        self
    }
}
