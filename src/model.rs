//! Data structures describing a paginated print document.
//!
//! The types in this module form a serialization-friendly description of a
//! report: page geometry, named styles and a list of content nodes. They
//! avoid referencing the rendering crate directly so descriptions can be
//! produced by the assembler, stored as templates, or handed to another
//! renderer as JSON. The JSON shape follows the pdfmake document definition,
//! so `pageMargins` is `[left, top, right, bottom]` in points and column widths
//! accept `"*"`, `"auto"` or a number of points.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::Cell;

/// Paper formats supported by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    /// ISO A3.
    A3,
    /// ISO A4.
    #[default]
    A4,
    /// ISO A5.
    A5,
    /// US Letter.
    #[serde(rename = "LETTER")]
    Letter,
    /// US Legal.
    #[serde(rename = "LEGAL")]
    Legal,
}

/// Page orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    /// Height exceeds width.
    #[default]
    Portrait,
    /// Width exceeds height.
    Landscape,
}

/// Box spacing in points, serialized as `[left, top, right, bottom]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Margins {
    /// Left spacing.
    pub left: f64,
    /// Top spacing.
    pub top: f64,
    /// Right spacing.
    pub right: f64,
    /// Bottom spacing.
    pub bottom: f64,
}

impl Margins {
    /// Creates margins from left, top, right and bottom values.
    pub const fn ltrb(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Uses the same spacing on every side.
    pub const fn all(value: f64) -> Self {
        Self::ltrb(value, value, value, value)
    }
}

impl From<[f64; 4]> for Margins {
    fn from([left, top, right, bottom]: [f64; 4]) -> Self {
        Self::ltrb(left, top, right, bottom)
    }
}

impl From<Margins> for [f64; 4] {
    fn from(margins: Margins) -> Self {
        [margins.left, margins.top, margins.right, margins.bottom]
    }
}

/// Horizontal placement of text and images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Right aligned content.
    Right,
    /// Fully justified paragraphs.
    Justify,
}

/// A named style. Unset attributes inherit from the default style.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDefinition {
    /// Font size in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Bold weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Italic slant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italics: Option<bool>,
    /// Horizontal alignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<HorizontalAlignment>,
    /// Outer spacing around the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margins>,
}

impl StyleDefinition {
    /// Creates an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the font size and returns the updated style.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Sets the bold flag and returns the updated style.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    /// Sets the italic flag and returns the updated style.
    pub fn with_italics(mut self, italics: bool) -> Self {
        self.italics = Some(italics);
        self
    }

    /// Sets the alignment and returns the updated style.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Sets the outer spacing and returns the updated style.
    pub fn with_margin(mut self, margin: Margins) -> Self {
        self.margin = Some(margin);
        self
    }
}

/// Style applied to every node before named styles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultStyle {
    /// Font family name; must match a registered family at render time.
    pub font: String,
    /// Default font size in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl DefaultStyle {
    /// Creates a default style using the given font family.
    pub fn new(font: impl Into<String>) -> Self {
        Self {
            font: font.into(),
            font_size: None,
        }
    }
}

/// A paragraph of text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    /// Paragraph content.
    pub text: String,
    /// Name of a style in [`DocumentDescription::styles`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Alignment overriding the style's alignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<HorizontalAlignment>,
}

impl TextNode {
    /// Creates an unstyled paragraph.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
            alignment: None,
        }
    }

    /// Sets the style name and returns the updated node.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Sets the alignment and returns the updated node.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }
}

/// Width of a table column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawColumnWidth", into = "RawColumnWidth")]
pub enum ColumnWidth {
    /// Shares the remaining width with the other star columns (`"*"`).
    Star,
    /// Sized to the content (`"auto"`).
    Auto,
    /// Fixed width in points.
    Fixed(f64),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawColumnWidth {
    Points(f64),
    Keyword(String),
}

impl TryFrom<RawColumnWidth> for ColumnWidth {
    type Error = InvalidColumnWidth;

    fn try_from(raw: RawColumnWidth) -> Result<Self, Self::Error> {
        match raw {
            RawColumnWidth::Points(points) if points.is_finite() && points >= 0.0 => {
                Ok(Self::Fixed(points))
            }
            RawColumnWidth::Points(points) => Err(InvalidColumnWidth(points.to_string())),
            RawColumnWidth::Keyword(keyword) => match keyword.as_str() {
                "*" => Ok(Self::Star),
                "auto" => Ok(Self::Auto),
                _ => Err(InvalidColumnWidth(keyword)),
            },
        }
    }
}

impl From<ColumnWidth> for RawColumnWidth {
    fn from(width: ColumnWidth) -> Self {
        match width {
            ColumnWidth::Star => Self::Keyword("*".into()),
            ColumnWidth::Auto => Self::Keyword("auto".into()),
            ColumnWidth::Fixed(points) => Self::Points(points),
        }
    }
}

/// Error returned for column widths other than `"*"`, `"auto"` or a
/// non-negative number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidColumnWidth(String);

impl fmt::Display for InvalidColumnWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid column width `{}`; expected \"*\", \"auto\" or a number of points",
            self.0
        )
    }
}

impl std::error::Error for InvalidColumnWidth {}

/// Predefined table border layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableLayoutName {
    /// No lines at all.
    NoBorders,
    /// A single line below the header rows.
    HeaderLineOnly,
    /// Thin lines between rows.
    #[default]
    LightHorizontalLines,
}

/// Column declaration and rows of a table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    /// Number of leading rows treated as headers.
    #[serde(default)]
    pub header_rows: usize,
    /// One entry per column.
    pub widths: Vec<ColumnWidth>,
    /// Rows, each with one cell per column.
    #[serde(default)]
    pub body: Vec<Vec<Cell>>,
}

/// A table node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableNode {
    /// Border layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<TableLayoutName>,
    /// Name of a style in [`DocumentDescription::styles`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Columns and rows.
    pub table: TableSpec,
}

/// An embedded raster image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageNode {
    /// Image as a `data:image/png;base64,...` URL.
    pub image: String,
    /// Rendered width in points; the height keeps the aspect ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Horizontal placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<HorizontalAlignment>,
}

/// Individual content nodes in document order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentNode {
    /// Styled paragraph.
    Text(TextNode),
    /// Table.
    Table(TableNode),
    /// Raster image.
    Image(ImageNode),
}

/// Declarative, data-only description of a paginated document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDescription {
    /// Paper format.
    #[serde(default)]
    pub page_size: PageSize,
    /// Page orientation.
    #[serde(default)]
    pub page_orientation: PageOrientation,
    /// Page margins in points.
    #[serde(default)]
    pub page_margins: Margins,
    /// Content nodes in document order.
    #[serde(default)]
    pub content: Vec<ContentNode>,
    /// Style applied to all content.
    pub default_style: DefaultStyle,
    /// Named styles referenced by content nodes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, StyleDefinition>,
}

impl DocumentDescription {
    /// Creates an empty portrait A4 description using the given font family.
    pub fn new(font: impl Into<String>) -> Self {
        Self {
            page_size: PageSize::default(),
            page_orientation: PageOrientation::default(),
            page_margins: Margins::default(),
            content: Vec::new(),
            default_style: DefaultStyle::new(font),
            styles: BTreeMap::new(),
        }
    }

    /// Returns the table nodes together with their content index.
    pub fn tables(&self) -> impl Iterator<Item = (usize, &TableNode)> {
        self.content
            .iter()
            .enumerate()
            .filter_map(|(index, node)| match node {
                ContentNode::Table(table) => Some((index, table)),
                _ => None,
            })
    }

    /// Looks up a named style.
    pub fn style(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.get(name)
    }

    /// Serializes the description as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
