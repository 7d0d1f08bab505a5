//! Error types shared by the look-ahead report pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Position of a source record inside the input dataset.
///
/// Displayed as a JSON path so that a failing record can be found in the
/// source file, e.g. `scheduleData[1].recentMilestones[0]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordLocation {
    /// The top-level dataset object.
    Dataset,
    /// A schedule group (project phase).
    Group {
        /// Index into `scheduleData`.
        group: usize,
    },
    /// A milestone event inside a schedule group.
    Milestone {
        /// Index into `scheduleData`.
        group: usize,
        /// Index into the group's `recentMilestones`.
        milestone: usize,
    },
}

impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset => write!(f, "dataset"),
            Self::Group { group } => write!(f, "scheduleData[{group}]"),
            Self::Milestone { group, milestone } => {
                write!(f, "scheduleData[{group}].recentMilestones[{milestone}]")
            }
        }
    }
}

/// Errors produced while parsing, assembling or rendering the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required field is absent (or null) on a source record.
    #[error("{location}: missing required field `{field}`")]
    MissingField {
        /// Where the incomplete record sits in the dataset.
        location: RecordLocation,
        /// Name of the missing field as spelled in the source JSON.
        field: &'static str,
    },

    /// A table row does not have one cell per declared column width.
    #[error("table {table}, row {row}: expected {expected} cells, found {found}")]
    ColumnMismatch {
        /// Index of the table node in the document content.
        table: usize,
        /// Index of the offending row in the table body.
        row: usize,
        /// Number of declared column widths.
        expected: usize,
        /// Number of cells in the row.
        found: usize,
    },

    /// The rendering or capture backend rejected its input.
    #[error("{adapter} rejected the input: {message}")]
    RenderAdapter {
        /// Name of the backend that failed.
        adapter: &'static str,
        /// Description of the failure.
        message: String,
        /// Underlying backend error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + 'static>>,
    },

    /// A document template does not contain the table node to populate.
    #[error("document template has no table node to populate")]
    MissingTablePlaceholder,

    /// The table a template populates does not declare one column per report
    /// column.
    #[error("template table {table} declares {found} columns, the report has {expected}")]
    TemplateColumns {
        /// Index of the table node in the template content.
        table: usize,
        /// Number of report columns.
        expected: usize,
        /// Number of column widths declared by the template.
        found: usize,
    },

    /// A document asks for a font family that is not registered.
    #[error("font family '{requested}' is not registered (available: '{registered}')")]
    UnknownFont {
        /// Family named by the document's default style.
        requested: String,
        /// Family configured for rendering.
        registered: String,
    },

    /// The configured font family could not be loaded.
    #[error("failed to load font family")]
    FontLoad(#[source] genpdf::error::Error),

    /// The input dataset is not well-formed JSON of the expected shape.
    #[error("malformed look-ahead dataset")]
    Dataset(#[source] serde_json::Error),

    /// The configuration file is not well-formed.
    #[error("invalid report configuration: {0}")]
    Config(String),

    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Wraps a backend error as a [`ReportError::RenderAdapter`].
    pub fn render_adapter<E>(adapter: &'static str, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::RenderAdapter {
            adapter,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Builds a [`ReportError::RenderAdapter`] without an underlying error.
    pub fn render_rejected(adapter: &'static str, message: impl Into<String>) -> Self {
        Self::RenderAdapter {
            adapter,
            message: message.into(),
            source: None,
        }
    }
}
