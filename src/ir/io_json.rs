//! JSON serialization for annotation collections.
//!
//! This is the exchange format the CLI uses for the viewer side of a
//! conversion: `ndpa import` writes it, `ndpa export` reads it. Geometry is
//! in pixel space, tagged by shape kind.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::model::AnnotationSet;
use crate::error::NdpaError;

/// Reads an annotation collection from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_annotations_json(path: &Path) -> Result<AnnotationSet, NdpaError> {
    let file = File::open(path).map_err(NdpaError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| NdpaError::AnnotationJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes an annotation collection to a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_annotations_json(path: &Path, annotations: &AnnotationSet) -> Result<(), NdpaError> {
    let file = File::create(path).map_err(NdpaError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, annotations).map_err(|source| {
        NdpaError::AnnotationJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(NdpaError::Io)
}

/// Reads an annotation collection from a JSON string.
pub fn from_json_str(json: &str) -> Result<AnnotationSet, serde_json::Error> {
    serde_json::from_str(json)
}

/// Writes an annotation collection to a pretty-printed JSON string.
pub fn to_json_string(annotations: &AnnotationSet) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(annotations)
}
