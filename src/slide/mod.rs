//! Slide calibration and the centre-offset resolver.
//!
//! NDPA coordinates are nanometres measured from the centre of the physical
//! slide. To place them on the image we need the pixel size and the offset
//! between the image corner and that origin. The offset starts at the image
//! centre and is corrected by two Hamamatsu metadata properties when the
//! slide reader exposes them.

mod info;

pub use info::{read_slide_info, SlideInfo};

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{info, warn};

use crate::conversion::{ConversionIssue, ConversionIssueCode, ConversionReport};
use crate::ir::{Coord, Pixel};

/// Extension the slide file must carry for NDPA companions to apply.
pub const SLIDE_EXTENSION: &str = "ndpi";

/// Metadata key for the horizontal offset of the image centre, in nm.
pub const X_OFFSET_PROPERTY: &str = "hamamatsu.XOffsetFromSlideCentre";

/// Metadata key for the vertical offset of the image centre, in nm.
pub const Y_OFFSET_PROPERTY: &str = "hamamatsu.YOffsetFromSlideCentre";

/// Read-only calibration of the source image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlideCalibration {
    /// Full-resolution width in pixels.
    pub width: u32,
    /// Full-resolution height in pixels.
    pub height: u32,
    /// Horizontal pixel size in micrometres, if known.
    pub pixel_width_um: Option<f64>,
    /// Vertical pixel size in micrometres, if known.
    pub pixel_height_um: Option<f64>,
}

impl SlideCalibration {
    /// Creates a calibration with unknown pixel size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_width_um: None,
            pixel_height_um: None,
        }
    }

    pub fn with_pixel_size_um(mut self, width_um: f64, height_um: f64) -> Self {
        self.pixel_width_um = Some(width_um);
        self.pixel_height_um = Some(height_um);
        self
    }

    /// Pixel size in nanometres, or `None` when either axis is unknown,
    /// zero, negative or not finite.
    pub fn pixel_size_nm(&self) -> Option<PixelSizeNm> {
        let usable = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
        let width = usable(self.pixel_width_um)?;
        let height = usable(self.pixel_height_um)?;
        Some(PixelSizeNm {
            width: width * 1000.0,
            height: height * 1000.0,
        })
    }

    #[inline]
    pub fn has_pixel_size(&self) -> bool {
        self.pixel_size_nm().is_some()
    }

    /// Geometric centre of the image in pixel space.
    pub fn image_center(&self) -> Coord<Pixel> {
        Coord::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

/// Physical size of one pixel along each axis, in nanometres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelSizeNm {
    pub width: f64,
    pub height: f64,
}

/// Pixel-space position of the NDPA coordinate origin, measured from the
/// image's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterOffset {
    pub x: f64,
    pub y: f64,
}

impl CenterOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Coord<Pixel>> for CenterOffset {
    fn from(coord: Coord<Pixel>) -> Self {
        Self::new(coord.x, coord.y)
    }
}

/// The slide's vendor metadata could not be opened.
///
/// This is distinct from a property that is present but zero.
#[derive(Clone, Debug, Error)]
#[error("slide metadata unavailable: {reason}")]
pub struct MetadataUnavailable {
    pub reason: String,
}

impl MetadataUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Source of vendor metadata properties for a slide.
///
/// Implemented by whatever reads the whole-slide image; this crate only
/// needs the string-keyed property table.
pub trait MetadataSource {
    /// Opens the slide's property table.
    fn properties(&self) -> Result<BTreeMap<String, String>, MetadataUnavailable>;
}

impl MetadataSource for BTreeMap<String, String> {
    fn properties(&self) -> Result<BTreeMap<String, String>, MetadataUnavailable> {
        Ok(self.clone())
    }
}

impl<T: MetadataSource + ?Sized> MetadataSource for &T {
    fn properties(&self) -> Result<BTreeMap<String, String>, MetadataUnavailable> {
        (**self).properties()
    }
}

/// A metadata source for slides whose reader exposes no properties.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn properties(&self) -> Result<BTreeMap<String, String>, MetadataUnavailable> {
        Err(MetadataUnavailable::new("no metadata source configured"))
    }
}

/// Resolves the centre offset for one import or export.
///
/// Starts from the image centre and subtracts each metadata correction
/// converted to pixels. Axes are corrected independently: a missing or
/// unparsable property only leaves its own axis uncorrected. Problems are
/// recorded in `report` and never fail the call.
pub fn resolve_center_offset(
    calibration: &SlideCalibration,
    pixel_size: PixelSizeNm,
    source: &impl MetadataSource,
    report: &mut ConversionReport,
) -> CenterOffset {
    let center = calibration.image_center();
    let mut offset = CenterOffset::from(center);

    let properties = match source.properties() {
        Ok(properties) => properties,
        Err(err) => {
            warn!(%err, "using uncorrected image centre as NDPA origin");
            report.add(ConversionIssue::warning(
                ConversionIssueCode::MetadataUnavailable,
                format!("{err}; using the image centre as origin"),
            ));
            return offset;
        }
    };

    if let Some(nm) = axis_correction(&properties, X_OFFSET_PROPERTY, report) {
        offset.x -= nm / pixel_size.width;
    }
    if let Some(nm) = axis_correction(&properties, Y_OFFSET_PROPERTY, report) {
        offset.y -= nm / pixel_size.height;
    }

    info!(x = offset.x, y = offset.y, "resolved NDPA centre offset");
    offset
}

fn axis_correction(
    properties: &BTreeMap<String, String>,
    key: &str,
    report: &mut ConversionReport,
) -> Option<f64> {
    let Some(raw) = properties.get(key) else {
        report.add(ConversionIssue::info(
            ConversionIssueCode::OffsetPropertyMissing,
            format!("metadata has no '{key}'; axis left at image centre"),
        ));
        return None;
    };

    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            warn!(key, raw = raw.as_str(), "unparsable offset property");
            report.add(ConversionIssue::warning(
                ConversionIssueCode::OffsetPropertyInvalid,
                format!("metadata '{key}' = '{raw}' is not a number; axis left at image centre"),
            ));
            None
        }
    }
}
