//! Conversion between NDPA records and in-memory annotations.
//!
//! [`decode`] turns parsed NDPA records (nanometres) into pixel-space
//! shapes; [`encode`] runs geometry clean-up on pixel-space shapes and
//! produces NDPA records. Both append what they skipped or changed to a
//! [`ConversionReport`].

pub mod decode;
pub mod encode;
pub mod report;

pub use decode::{decode_ndpa_str, decode_records};
pub use encode::{encode_annotations, encode_ndpa_string, CLEAR_COLOR, CLEAR_TITLE};
pub use report::{
    ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity,
};

/// Side name used in reports for NDPA files.
pub const NDPA_SIDE: &str = "ndpa";

/// Side name used in reports for in-memory annotations.
pub const ANNOTATIONS_SIDE: &str = "annotations";

/// Tunables for import and export.
///
/// The defaults reproduce what NDP.view users expect; they only need
/// changing for unusual slides.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionOptions {
    /// Douglas-Peucker distance tolerance in pixels.
    pub simplify_tolerance: f64,
    /// Polygons with a smaller area (px²) are dropped on export.
    pub min_fragment_area: f64,
    /// Holes with a smaller area (px²) are filled on export.
    pub min_hole_area: f64,
    /// Vertex count used to turn circles into freehand rings.
    pub ellipse_segments: usize,
    /// Mirror freehand `y` values against the slide height on import.
    ///
    /// Kept for viewers that display slides upside down; off by default.
    pub rotated: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            simplify_tolerance: 5.0,
            min_fragment_area: 200.0,
            min_hole_area: 200.0,
            ellipse_segments: 64,
            rotated: false,
        }
    }
}
