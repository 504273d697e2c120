//! Physical ⇄ pixel coordinate transform.
//!
//! Each axis is an independent linear map:
//!
//! ```text
//! pixel    = physical / pixel_size_nm + offset_px
//! physical = trunc((pixel - offset_px) * pixel_size_nm)
//! ```
//!
//! NDPA stores physical coordinates as integers, so the physical direction
//! truncates toward zero.

use crate::ir::{Coord, Physical, Pixel};
use crate::slide::{CenterOffset, PixelSizeNm};

/// Maps a physical value (nm) to a pixel value along one axis.
#[inline]
pub fn to_pixel(physical: f64, pixel_size_nm: f64, offset_px: f64) -> f64 {
    physical / pixel_size_nm + offset_px
}

/// Maps a pixel value to an integer physical value (nm) along one axis.
#[inline]
pub fn to_physical(pixel: f64, pixel_size_nm: f64, offset_px: f64) -> i64 {
    ((pixel - offset_px) * pixel_size_nm).trunc() as i64
}

/// Both axes of the transform for one slide and one resolved offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordTransform {
    pub pixel_size: PixelSizeNm,
    pub offset: CenterOffset,
}

impl CoordTransform {
    pub fn new(pixel_size: PixelSizeNm, offset: CenterOffset) -> Self {
        Self { pixel_size, offset }
    }

    pub fn to_pixel(&self, point: Coord<Physical>) -> Coord<Pixel> {
        Coord::new(
            to_pixel(point.x, self.pixel_size.width, self.offset.x),
            to_pixel(point.y, self.pixel_size.height, self.offset.y),
        )
    }

    /// The returned coordinate always holds whole nanometre values.
    pub fn to_physical(&self, point: Coord<Pixel>) -> Coord<Physical> {
        Coord::new(
            to_physical(point.x, self.pixel_size.width, self.offset.x) as f64,
            to_physical(point.y, self.pixel_size.height, self.offset.y) as f64,
        )
    }

    /// Converts a physical length to pixel lengths along `(x, y)`.
    ///
    /// Lengths are not offset, only scaled.
    pub fn length_to_pixels(&self, nm: f64) -> (f64, f64) {
        (nm / self.pixel_size.width, nm / self.pixel_size.height)
    }
}
