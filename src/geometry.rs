//! Geometry clean-up before NDPA export.
//!
//! NDP.view only understands flat lists of closed freehand rings, so every
//! area annotation goes through three steps:
//!
//! 1. topology-preserving Douglas-Peucker simplification,
//! 2. removal of fragments and holes below an area threshold,
//! 3. decomposition into rings: each polygon's exterior, then its holes.

use geo::{Area, Contains, Intersects, Simplify};
use geo::{Line, LineString, MultiPolygon, Point, Polygon};

use crate::conversion::ConversionOptions;
use crate::ir::{Coord, Pixel, PolygonPart, ShapeGeometry, ShapeKind};

/// One ring of a processed polygon, ready to become an NDPA record.
#[derive(Clone, Debug, PartialEq)]
pub struct RingRecord {
    /// 0 for the exterior ring of a polygon, 1.. for its holes.
    pub index: usize,
    /// Ring vertices without the duplicated closing point.
    pub points: Vec<Coord<Pixel>>,
}

impl RingRecord {
    #[inline]
    pub fn is_exterior(&self) -> bool {
        self.index == 0
    }
}

/// Why a shape produced no rings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Points, lines and polylines enclose no area.
    NoArea(ShapeKind),
    NonFinite,
    /// Nothing survived simplification and small-area removal.
    Empty,
}

/// Runs the full pipeline on one annotation's geometry.
pub fn shape_rings(
    geometry: &ShapeGeometry,
    options: &ConversionOptions,
) -> Result<Vec<RingRecord>, SkipReason> {
    let region = to_multi_polygon(geometry, options.ellipse_segments)?;
    let simplified = simplify_preserving_topology(&region, options.simplify_tolerance);
    let refined = refine_areas(simplified, options.min_fragment_area, options.min_hole_area);

    let rings = extract_rings(&refined);
    if rings.is_empty() {
        return Err(SkipReason::Empty);
    }
    Ok(rings)
}

/// Converts an area shape to a pixel-space multi-polygon.
pub fn to_multi_polygon(
    geometry: &ShapeGeometry,
    ellipse_segments: usize,
) -> Result<MultiPolygon<f64>, SkipReason> {
    let polygons = match geometry {
        ShapeGeometry::Point { .. }
        | ShapeGeometry::Line { .. }
        | ShapeGeometry::Polyline { .. } => return Err(SkipReason::NoArea(geometry.kind())),
        ShapeGeometry::Circle {
            center,
            radius_x,
            radius_y,
        } => vec![ellipse(*center, *radius_x, *radius_y, ellipse_segments.max(8))],
        ShapeGeometry::Rectangle { corner, opposite } => {
            let (x0, x1) = (corner.x.min(opposite.x), corner.x.max(opposite.x));
            let (y0, y1) = (corner.y.min(opposite.y), corner.y.max(opposite.y));
            vec![Polygon::new(
                LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]),
                vec![],
            )]
        }
        ShapeGeometry::Polygon { parts } => parts.iter().filter_map(part_to_polygon).collect(),
    };

    let region = MultiPolygon::new(polygons);
    let finite = region
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .flat_map(|ring| ring.coords())
        .all(|c| c.x.is_finite() && c.y.is_finite());
    if !finite {
        return Err(SkipReason::NonFinite);
    }
    Ok(region)
}

fn part_to_polygon(part: &PolygonPart) -> Option<Polygon<f64>> {
    if part.exterior.len() < 3 {
        return None;
    }
    let ring = |points: &[Coord<Pixel>]| {
        LineString::new(points.iter().map(|&p| geo::Coord::from(p)).collect())
    };
    let holes = part
        .holes
        .iter()
        .filter(|hole| hole.len() >= 3)
        .map(|hole| ring(hole.as_slice()))
        .collect();
    Some(Polygon::new(ring(part.exterior.as_slice()), holes))
}

fn ellipse(center: Coord<Pixel>, rx: f64, ry: f64, segments: usize) -> Polygon<f64> {
    let points: Vec<(f64, f64)> = (0..segments)
        .map(|i| {
            let t = std::f64::consts::TAU * i as f64 / segments as f64;
            (center.x + rx * t.cos(), center.y + ry * t.sin())
        })
        .collect();
    Polygon::new(LineString::from(points), vec![])
}

/// Douglas-Peucker simplification that never breaks a polygon's topology.
///
/// Each ring is simplified on its own. A simplified ring is only accepted if
/// it still has at least three distinct vertices, does not self-intersect
/// and does not cross a ring already accepted for the same polygon; holes
/// must also stay inside the exterior. Otherwise the original ring is kept.
///
/// A simplified polygon must also stay clear of the other parts of the
/// region, compared against their final form for earlier parts and their
/// original form for later ones. If it would cross or swallow one, the
/// original polygon is kept.
pub fn simplify_preserving_topology(
    region: &MultiPolygon<f64>,
    tolerance: f64,
) -> MultiPolygon<f64> {
    if tolerance <= 0.0 {
        return region.clone();
    }
    let originals = &region.0;
    let mut accepted: Vec<Polygon<f64>> = Vec::with_capacity(originals.len());
    for (i, polygon) in originals.iter().enumerate() {
        let candidate = simplify_polygon(polygon, tolerance);
        let conflicts = accepted
            .iter()
            .chain(&originals[i + 1..])
            .any(|other| polygons_overlap(&candidate, other));
        accepted.push(if conflicts { polygon.clone() } else { candidate });
    }
    MultiPolygon::new(accepted)
}

/// True if the boundaries of `a` and `b` cross or one lies inside the other.
fn polygons_overlap(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    if rings_of(a).any(|ra| rings_of(b).any(|rb| rings_cross(ra, rb))) {
        return true;
    }
    let starts_inside = |outer: &Polygon<f64>, inner: &Polygon<f64>| {
        inner
            .exterior()
            .0
            .first()
            .map(|&c| outer.contains(&Point::from(c)))
            .unwrap_or(false)
    };
    starts_inside(a, b) || starts_inside(b, a)
}

fn rings_of(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let exterior = simplify_ring(polygon.exterior(), tolerance, &[]);
    let outline = Polygon::new(exterior.clone(), vec![]);

    let mut accepted = vec![exterior];
    for hole in polygon.interiors() {
        let ring = simplify_ring(hole, tolerance, &accepted);
        let inside = ring
            .0
            .first()
            .map(|&c| outline.contains(&Point::from(c)))
            .unwrap_or(false);
        if !inside || accepted.iter().any(|other| rings_cross(&ring, other)) {
            // The original hole conflicts with the simplified rings.
            return polygon.clone();
        }
        accepted.push(ring);
    }

    let exterior = accepted.remove(0);
    Polygon::new(exterior, accepted)
}

fn simplify_ring(
    ring: &LineString<f64>,
    tolerance: f64,
    others: &[LineString<f64>],
) -> LineString<f64> {
    let simplified = ring.simplify(&tolerance);
    let valid = simplified.0.len() >= 4
        && is_simple(&simplified)
        && others.iter().all(|other| !rings_cross(&simplified, other));
    if valid {
        simplified
    } else {
        ring.clone()
    }
}

/// True if no two non-adjacent segments of the closed ring intersect.
fn is_simple(ring: &LineString<f64>) -> bool {
    let segments: Vec<Line<f64>> = ring.lines().collect();
    let n = segments.len();
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if segments[i].intersects(&segments[j]) {
                return false;
            }
        }
    }
    true
}

fn rings_cross(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    a.lines().any(|sa| b.lines().any(|sb| sa.intersects(&sb)))
}

/// Drops polygons whose area is below `min_fragment_area` and holes whose
/// area is below `min_hole_area` (the hole is filled in).
pub fn refine_areas(
    region: MultiPolygon<f64>,
    min_fragment_area: f64,
    min_hole_area: f64,
) -> MultiPolygon<f64> {
    region
        .into_iter()
        .filter_map(|polygon| {
            let (exterior, interiors) = polygon.into_inner();
            let holes = interiors
                .into_iter()
                .filter(|hole| ring_area(hole) >= min_hole_area)
                .collect();
            let polygon = Polygon::new(exterior, holes);
            (polygon.unsigned_area() >= min_fragment_area).then_some(polygon)
        })
        .collect()
}

fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), vec![]).unsigned_area()
}

/// Flattens polygons into rings: each exterior followed by its holes.
pub fn extract_rings(region: &MultiPolygon<f64>) -> Vec<RingRecord> {
    region
        .iter()
        .flat_map(|polygon| {
            rings_of(polygon).enumerate()
                .map(|(index, ring)| RingRecord {
                    index,
                    points: open_ring(ring),
                })
        })
        .collect()
}

fn open_ring(ring: &LineString<f64>) -> Vec<Coord<Pixel>> {
    let mut coords: Vec<Coord<Pixel>> = ring.coords().map(|&c| Coord::from(c)).collect();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}
