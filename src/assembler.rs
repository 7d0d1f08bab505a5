//! Assembly of document descriptions from milestone records.
//!
//! A [`DocumentTemplate`] holds the static part of the report (page geometry,
//! styles, narrative text) and a table whose body is replaced on every
//! [`build_document`] call. Nothing else in the template is touched, so
//! customizations survive regeneration.

use std::path::Path;

use log::debug;

use crate::error::{ReportError, Result};
use crate::fonts::DEFAULT_FONT_FAMILY_NAME;
use crate::model::{
    ColumnWidth, ContentNode, DocumentDescription, HorizontalAlignment, ImageNode, Margins,
    PageOrientation, PageSize, StyleDefinition, TableLayoutName, TableNode, TableSpec, TextNode,
};
use crate::schedule::FlatMilestoneRecord;
use crate::table::{header_row, to_display_row, Cell, COLUMN_COUNT};

/// Title printed above the table.
pub const REPORT_TITLE: &str = "Look Ahead Table";

/// Narrative shown between the title and the table until replaced by a
/// custom template.
pub const REPORT_DESCRIPTION: &str = "Input your description here, Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. Duis aute irure dolor in reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur. Excepteur sint occaecat cupidatat non proident, sunt in culpa qui officia deserunt mollit anim id est laborum.";

/// Page margins in points, `[left, top, right, bottom]`.
pub const PAGE_MARGINS: Margins = Margins::ltrb(40.0, 60.0, 40.0, 60.0);

/// Width of the snapshot image in points.
pub const DEFAULT_SNAPSHOT_WIDTH: f64 = 600.0;

/// Immutable report template with a table to populate.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentTemplate {
    description: DocumentDescription,
    table_index: usize,
}

impl DocumentTemplate {
    /// Builds the look-ahead template using the given font family.
    pub fn look_ahead(font_family: impl Into<String>) -> Self {
        let mut description = DocumentDescription::new(font_family);
        description.page_size = PageSize::A4;
        description.page_orientation = PageOrientation::Landscape;
        description.page_margins = PAGE_MARGINS;
        description.styles = [
            ("withMargin", StyleDefinition::new().with_margin(Margins::all(20.0))),
            (
                "alignCenter",
                StyleDefinition::new().with_alignment(HorizontalAlignment::Center),
            ),
            ("header", StyleDefinition::new().with_font_size(18.0).with_bold(true)),
            ("textBody", StyleDefinition::new().with_font_size(12.0)),
            ("subheader", StyleDefinition::new().with_font_size(15.0).with_bold(true)),
            ("quote", StyleDefinition::new().with_italics(true)),
            ("small", StyleDefinition::new().with_font_size(8.0)),
        ]
        .into_iter()
        .map(|(name, style)| (name.to_string(), style))
        .collect();

        description.content = vec![
            ContentNode::Text(
                TextNode::new(REPORT_TITLE)
                    .with_style("header")
                    .with_alignment(HorizontalAlignment::Center),
            ),
            ContentNode::Text(
                TextNode::new(REPORT_DESCRIPTION)
                    .with_style("textBody")
                    .with_alignment(HorizontalAlignment::Justify),
            ),
            ContentNode::Table(TableNode {
                layout: Some(TableLayoutName::LightHorizontalLines),
                style: Some("withMargin".into()),
                table: TableSpec {
                    header_rows: 1,
                    widths: vec![
                        ColumnWidth::Star,
                        ColumnWidth::Auto,
                        ColumnWidth::Fixed(100.0),
                        ColumnWidth::Star,
                        ColumnWidth::Star,
                        ColumnWidth::Star,
                        ColumnWidth::Star,
                        ColumnWidth::Star,
                    ],
                    body: Vec::new(),
                },
            }),
        ];

        Self {
            description,
            table_index: 2,
        }
    }

    /// Wraps a custom description. The first table node becomes the one
    /// populated by [`build_document`] and must declare one width per report
    /// column.
    pub fn from_description(description: DocumentDescription) -> Result<Self> {
        let (table_index, node) = description
            .tables()
            .next()
            .ok_or(ReportError::MissingTablePlaceholder)?;
        if node.table.widths.len() != COLUMN_COUNT {
            return Err(ReportError::TemplateColumns {
                table: table_index,
                expected: COLUMN_COUNT,
                found: node.table.widths.len(),
            });
        }
        Ok(Self {
            description,
            table_index,
        })
    }

    /// Parses a custom template from pdfmake-style JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let description = serde_json::from_str(json)
            .map_err(|err| ReportError::Config(format!("template: {err}")))?;
        Self::from_description(description)
    }

    /// Reads a custom template from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path.as_ref())?)
    }

    /// Returns the template description.
    pub fn description(&self) -> &DocumentDescription {
        &self.description
    }

    /// Returns the content index of the table populated by [`build_document`].
    pub fn table_index(&self) -> usize {
        self.table_index
    }

    /// Font family named by the template's default style.
    pub fn font_family(&self) -> &str {
        &self.description.default_style.font
    }
}

impl Default for DocumentTemplate {
    fn default() -> Self {
        Self::look_ahead(DEFAULT_FONT_FAMILY_NAME)
    }
}

/// Produces the printable description for the given records.
///
/// The template's table body becomes the header row followed by one display
/// row per record. Calling this twice with the same input yields equal
/// descriptions.
pub fn build_document(
    records: &[FlatMilestoneRecord],
    template: &DocumentTemplate,
) -> DocumentDescription {
    let mut description = template.description.clone();
    let body: Vec<Vec<Cell>> = std::iter::once(header_row())
        .chain(records.iter().map(|record| to_display_row(record).into_cells()))
        .collect();

    if let Some(ContentNode::Table(node)) = description.content.get_mut(template.table_index) {
        node.table.body = body;
    }

    debug!("assembled document with {} milestone rows", records.len());
    description
}

/// Checks that every table row has one cell per declared column width.
pub fn validate_columns(description: &DocumentDescription) -> Result<()> {
    for (table, node) in description.tables() {
        let expected = node.table.widths.len();
        if let Some((row, cells)) = node
            .table
            .body
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != expected)
        {
            return Err(ReportError::ColumnMismatch {
                table,
                row,
                expected,
                found: cells.len(),
            });
        }
    }
    Ok(())
}

/// Produces a minimal description embedding a single snapshot image, using
/// the page geometry and default font of the template.
pub fn snapshot_document(
    image_data_url: impl Into<String>,
    template: &DocumentTemplate,
    width: f64,
) -> DocumentDescription {
    let source = &template.description;
    let mut description = DocumentDescription::new(source.default_style.font.clone());
    description.page_size = source.page_size;
    description.page_orientation = source.page_orientation;
    description.page_margins = source.page_margins;
    description.content = vec![ContentNode::Image(ImageNode {
        image: image_data_url.into(),
        width: Some(width),
        alignment: Some(HorizontalAlignment::Center),
    })];
    description
}
