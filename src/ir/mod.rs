//! In-memory annotation types and the file formats that carry them.
//!
//! Two coordinate spaces meet here: NDPA files store physical nanometres
//! measured from the slide centre, while the viewer works in image pixels
//! from the top-left corner. [`Coord`] carries its space as a type
//! parameter so the two cannot be mixed up.
//!
//! # Example
//!
//! ```
//! use ndpa::ir::{AnnotationSet, AnnotationShape, Color, Coord, ShapeGeometry};
//!
//! let mut set = AnnotationSet::new();
//! set.push(
//!     AnnotationShape::new(
//!         "stroma",
//!         ShapeGeometry::polygon(vec![
//!             Coord::new(10.0, 10.0),
//!             Coord::new(90.0, 10.0),
//!             Coord::new(50.0, 80.0),
//!         ]),
//!     )
//!     .with_color(Color::rgb(0, 255, 0)),
//! );
//! assert_eq!(set.len(), 1);
//! ```

mod color;
mod coord;
pub mod io_json;
pub mod io_ndpa_xml;
mod model;
mod space;

pub use color::{Color, ParseColorError};
pub use coord::Coord;
pub use model::{AnnotationSet, AnnotationShape, PolygonPart, ShapeGeometry, ShapeKind};
pub use space::{Physical, Pixel};
