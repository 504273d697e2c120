//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! between pixel-space and physical (nanometre) coordinates at compile time.

use std::fmt;

/// Marker type for image-pixel coordinates.
///
/// (0, 0) is the top-left corner of the full-resolution slide image.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for physical coordinates, in nanometres.
///
/// This is the native unit of NDPA files. The origin is the slide centre,
/// not the image corner, so these values are only meaningful together with a
/// [`CenterOffset`](crate::slide::CenterOffset).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Physical {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since Pixel has no variants
    }
}

impl fmt::Debug for Physical {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since Physical has no variants
    }
}
