//! Conversion report types for tracking recoverable problems and policy
//! decisions.
//!
//! Every import and export returns one of these alongside success, so the
//! caller can see exactly which records were skipped and why.

use serde::Serialize;
use std::fmt;

/// A report generated during an NDPA import or export.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Source side name (`ndpa` or `annotations`).
    pub from: String,
    /// Target side name.
    pub to: String,
    /// Counts on the input side.
    pub input: ConversionCounts,
    /// Counts on the output side.
    pub output: ConversionCounts,
    /// Issues discovered during conversion.
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    /// Create a new empty report for a conversion between two sides.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Count of warning-level issues.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    /// Count of info-level issues.
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }

    /// Count of issues carrying `code`.
    pub fn count(&self, code: ConversionIssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }

    /// Number of NDPA records that could not be parsed.
    pub fn failed_records(&self) -> usize {
        self.count(ConversionIssueCode::RecordParseFailed)
    }

    /// Iterate over warning messages.
    pub fn warning_messages(&self) -> impl Iterator<Item = &str> {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .map(|i| i.message.as_str())
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {} -> {}: {} annotations, {} records in; {} annotations, {} records out",
            self.from,
            self.to,
            self.input.annotations,
            self.input.records,
            self.output.annotations,
            self.output.records
        )?;

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Counts of converted elements.
///
/// `annotations` are in-memory shapes; `records` are `<ndpviewstate>`
/// elements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    pub annotations: usize,
    pub records: usize,
}

/// A single issue discovered during conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Create a warning-level issue (something was lost or degraded).
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue (policy note).
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

/// Severity level for conversion issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    /// Data was skipped or a fallback was used.
    Warning,
    /// A policy decision; nothing was lost.
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    // Offset resolution
    /// The slide metadata could not be opened; the image centre was used.
    MetadataUnavailable,
    /// An offset property was absent; that axis uses the image centre.
    OffsetPropertyMissing,
    /// An offset property was not a number; that axis uses the image centre.
    OffsetPropertyInvalid,

    // Reading
    /// An `<ndpviewstate>` element was malformed and skipped.
    RecordParseFailed,
    /// An annotation type other than circle/linearmeasure/pin/freehand.
    UnsupportedAnnotationType,
    /// An annotation color was not `#RRGGBB`; the default color is used.
    InvalidColor,

    // Writing
    /// Points, lines and polylines have no area and are not exported.
    NonAreaShapeSkipped,
    /// A shape vanished after simplification and small-area removal.
    EmptyGeometrySkipped,
    /// A shape has non-finite coordinates and is not exported.
    NonFiniteGeometrySkipped,
    /// Holes are written as separate `clear` records.
    InteriorRingsAsClearRecords,
    /// An existing NDPA file was copied before being overwritten.
    BackupCreated,
}
