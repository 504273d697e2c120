//! Import and export for one slide's NDPA companion file.
//!
//! An [`NdpaSession`] is created per slide and holds everything a
//! conversion needs: the slide path, its calibration, a metadata source and
//! the conversion options. The centre offset is resolved again on every
//! call, so nothing is cached between an import and a later export.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::conversion::{
    decode_ndpa_str, encode_ndpa_string, ConversionIssue, ConversionIssueCode, ConversionOptions,
    ConversionReport, ANNOTATIONS_SIDE, NDPA_SIDE,
};
use crate::error::NdpaError;
use crate::ir::AnnotationSet;
use crate::slide::{
    resolve_center_offset, MetadataSource, NoMetadata, PixelSizeNm, SlideCalibration,
    SLIDE_EXTENSION,
};
use crate::transform::CoordTransform;

/// Extension appended to the slide path to locate the annotation file.
pub const ANNOTATION_EXTENSION: &str = "ndpa";

/// Extension appended to the annotation path for backups.
pub const BACKUP_EXTENSION: &str = "bak";

/// The NDPA companion path for a slide: the slide path with `.ndpa` appended.
pub fn annotation_path_for(slide_path: &Path) -> PathBuf {
    append_extension(slide_path, ANNOTATION_EXTENSION)
}

/// First free backup path for `ndpa_path`: `<ndpa>.bak`, then `<ndpa>.bak.1`,
/// `<ndpa>.bak.2`, and so on.
pub fn backup_path_for(ndpa_path: &Path) -> PathBuf {
    let base = append_extension(ndpa_path, BACKUP_EXTENSION);
    if !base.exists() {
        return base;
    }
    (1u64..)
        .map(|n| append_extension(&base, &n.to_string()))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut raw = OsString::from(path.as_os_str());
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

/// Converts annotations between one slide's NDPA file and memory.
#[derive(Clone, Debug)]
pub struct NdpaSession<M = NoMetadata> {
    slide_path: PathBuf,
    calibration: SlideCalibration,
    metadata: M,
    options: ConversionOptions,
}

impl<M: MetadataSource> NdpaSession<M> {
    pub fn new(slide_path: impl Into<PathBuf>, calibration: SlideCalibration, metadata: M) -> Self {
        Self {
            slide_path: slide_path.into(),
            calibration,
            metadata,
            options: ConversionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    /// Path of the NDPA companion file.
    pub fn annotation_path(&self) -> PathBuf {
        annotation_path_for(&self.slide_path)
    }

    /// Reads the companion file and appends its annotations to `target`.
    ///
    /// Every imported annotation is locked and carries `classification` if
    /// given. Shapes are appended in one step after the whole file has been
    /// read; on error `target` is left untouched.
    ///
    /// # Errors
    /// Fails if the slide is not an NDPI file, has no pixel size, has no
    /// companion file, or the file is not well-formed XML. Malformed
    /// records are skipped and listed in the returned report instead.
    pub fn import(
        &self,
        target: &mut AnnotationSet,
        classification: Option<&str>,
    ) -> Result<ConversionReport, NdpaError> {
        let pixel_size = self.check_preconditions()?;

        let path = self.annotation_path();
        if !path.is_file() {
            return Err(NdpaError::AnnotationFileMissing { path });
        }
        let xml = fs::read_to_string(&path).map_err(NdpaError::Io)?;

        let mut report = ConversionReport::new(NDPA_SIDE, ANNOTATIONS_SIDE);
        let transform = self.transform(pixel_size, &mut report);
        let shapes = decode_ndpa_str(
            &xml,
            &path,
            &transform,
            &self.calibration,
            classification,
            &self.options,
            &mut report,
        )?;

        info!(
            path = %path.display(),
            imported = shapes.len(),
            failed = report.failed_records(),
            "imported NDPA annotations"
        );
        target.extend(shapes);
        Ok(report)
    }

    /// Writes `annotations` to the companion file.
    ///
    /// An existing file is first copied to the next free backup path. The
    /// new document is written to a temporary file next to the target and
    /// then moved into place, so a failed export never leaves a partial file.
    ///
    /// # Errors
    /// Fails on the same preconditions as [`import`](Self::import), if the
    /// backup cannot be written (the old file is then left unchanged), or if
    /// the new file cannot be written.
    pub fn export(&self, annotations: &AnnotationSet) -> Result<ConversionReport, NdpaError> {
        let pixel_size = self.check_preconditions()?;

        let mut report = ConversionReport::new(ANNOTATIONS_SIDE, NDPA_SIDE);
        let transform = self.transform(pixel_size, &mut report);
        let path = self.annotation_path();
        let xml = encode_ndpa_string(
            annotations,
            &transform,
            &self.calibration,
            &self.options,
            &mut report,
        )
        .map_err(|err| match err {
            NdpaError::NdpaWrite { message, .. } => NdpaError::NdpaWrite {
                path: path.clone(),
                message,
            },
            other => other,
        })?;

        if path.exists() {
            let backup = backup_path_for(&path);
            fs::copy(&path, &backup).map_err(|source| NdpaError::BackupWrite {
                path: backup.clone(),
                source,
            })?;
            info!(backup = %backup.display(), "backed up existing NDPA file");
            report.add(ConversionIssue::info(
                ConversionIssueCode::BackupCreated,
                format!("existing file copied to {}", backup.display()),
            ));
        }

        write_atomically(&path, xml.as_bytes())?;
        info!(
            path = %path.display(),
            records = report.output.records,
            "exported NDPA annotations"
        );
        Ok(report)
    }

    fn check_preconditions(&self) -> Result<PixelSizeNm, NdpaError> {
        let is_ndpi = self
            .slide_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(SLIDE_EXTENSION))
            .unwrap_or(false);
        if !is_ndpi {
            return Err(NdpaError::Precondition {
                path: self.slide_path.clone(),
                message: format!("NDPA annotations only apply to .{SLIDE_EXTENSION} slides"),
            });
        }

        self.calibration
            .pixel_size_nm()
            .ok_or_else(|| NdpaError::Precondition {
                path: self.slide_path.clone(),
                message: "slide has no usable pixel size calibration".to_string(),
            })
    }

    fn transform(&self, pixel_size: PixelSizeNm, report: &mut ConversionReport) -> CoordTransform {
        let offset = resolve_center_offset(&self.calibration, pixel_size, &self.metadata, report);
        CoordTransform::new(pixel_size, offset)
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), NdpaError> {
    let write_error = |message: String| NdpaError::NdpaWrite {
        path: path.to_path_buf(),
        message,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = temp_file_in(parent)
        .map_err(|err| write_error(format!("cannot create temporary file: {err}")))?;
    file.write_all(contents)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|err| write_error(err.to_string()))?;

    // The replacement keeps the mode of the file it overwrites.
    if let Ok(existing) = fs::metadata(path) {
        fs::set_permissions(file.path(), existing.permissions())
            .map_err(|err| write_error(format!("cannot copy file permissions: {err}")))?;
    }

    file.persist(path).map_err(|err| {
        warn!(path = %path.display(), error = %err.error, "could not move NDPA file into place");
        write_error(err.error.to_string())
    })?;
    Ok(())
}

/// A temporary file in `dir` created with the mode a plain `File::create`
/// would get, rather than owner-only.
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".ndpa-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}
