//! Look-ahead milestone report.
//!
//! The pipeline flattens a nested schedule dataset into milestone records
//! ([`schedule`]), projects them onto the fixed report columns ([`table`]),
//! assembles a declarative print document ([`assembler`], [`model`]) and hands
//! it to a PDF renderer ([`builder`]). A second export path rasterizes the
//! on-screen table ([`capture`]) and embeds the bitmap in a PDF instead.
//! [`export`] ties both paths to a single downloadable artifact.

pub mod assembler;
pub mod builder;
pub mod capture;
pub mod config;
pub mod elements;
pub mod error;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod sample;
pub mod schedule;
pub mod table;

pub use assembler::{build_document, snapshot_document, validate_columns, DocumentTemplate};
pub use builder::{DocumentRenderer, PdfRenderer, RenderedPdf};
pub use capture::{render_table, GlyphRasterizer, RasterCapture, RenderedTable, Snapshot};
pub use config::ReportConfig;
pub use error::{RecordLocation, ReportError, Result};
pub use export::{ArtifactHandle, ExportSession};
pub use model::DocumentDescription;
pub use schedule::{
    flatten, CompletionDate, FlatMilestoneRecord, LookAheadDataset, MilestoneEvent,
    MilestoneStatus, ScheduleGroup,
};
pub use table::{display_rows, to_display_row, Cell, DisplayRow, StyledCell};
