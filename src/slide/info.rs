//! Slide description sidecar files.
//!
//! The CLI does not decode whole-slide images itself. Instead the caller
//! describes the slide in a small JSON or YAML file:
//!
//! ```yaml
//! width: 51200
//! height: 38400
//! pixel_width_um: 0.2275
//! pixel_height_um: 0.2275
//! properties:
//!   hamamatsu.XOffsetFromSlideCentre: "1534000"
//!   hamamatsu.YOffsetFromSlideCentre: "-820000"
//! ```
//!
//! Leaving out `properties` means the slide's metadata is unavailable, which
//! is not the same as an empty table.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{MetadataSource, MetadataUnavailable, SlideCalibration};
use crate::error::NdpaError;

/// Calibration and vendor properties for one slide.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideInfo {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_width_um: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_height_um: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, String>>,
}

impl SlideInfo {
    pub fn calibration(&self) -> SlideCalibration {
        SlideCalibration {
            width: self.width,
            height: self.height,
            pixel_width_um: self.pixel_width_um,
            pixel_height_um: self.pixel_height_um,
        }
    }
}

impl MetadataSource for SlideInfo {
    fn properties(&self) -> Result<BTreeMap<String, String>, MetadataUnavailable> {
        self.properties
            .clone()
            .ok_or_else(|| MetadataUnavailable::new("slide info has no 'properties' table"))
    }
}

/// Reads a slide info file. `.yaml`/`.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn read_slide_info(path: &Path) -> Result<SlideInfo, NdpaError> {
    let text = fs::read_to_string(path).map_err(NdpaError::Io)?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let parsed = if is_yaml {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| NdpaError::SlideInfoParse {
        path: path.to_path_buf(),
        message,
    })
}
