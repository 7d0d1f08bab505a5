//! Row projection shared by the on-screen table and the printable document.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::schedule::FlatMilestoneRecord;

/// Number of columns in the look-ahead table.
pub const COLUMN_COUNT: usize = 8;

/// Column titles, in display order.
pub const COLUMN_HEADERS: [&str; COLUMN_COUNT] = [
    "Project",
    "Project Phase",
    "Recent Milestone",
    "Baseline",
    "Status",
    "Planned",
    "Completion",
    "Total Delay",
];

/// Index of the status column.
pub const STATUS_COLUMN: usize = 4;

/// A single table cell.
///
/// Serialized untagged so a row reads as a plain JSON array such as
/// `["A", "P1", null, 2]`. Object cells such as
/// `{"text": "Bold value", "bold": true}` are accepted as well.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// No value.
    Null,
    /// A numeric value, kept as delivered.
    Number(Number),
    /// A text value.
    Text(String),
    /// Text with its own emphasis.
    Styled(StyledCell),
}

/// Text cell carrying inline emphasis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledCell {
    /// Cell content.
    pub text: String,
    /// Bold weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Italic slant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italics: Option<bool>,
}

impl Cell {
    /// Returns the text shown for the cell; empty for [`Cell::Null`].
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Number(number) => Cow::Owned(number.to_string()),
            Self::Text(text) => Cow::Borrowed(text),
            Self::Styled(cell) => Cow::Borrowed(&cell.text),
        }
    }

    /// Inline emphasis of the cell, if any.
    pub fn emphasis(&self) -> Option<&StyledCell> {
        match self {
            Self::Styled(cell) => Some(cell),
            _ => None,
        }
    }

    /// Returns whether the cell holds no value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

impl From<Number> for Cell {
    fn from(number: Number) -> Self {
        Self::Number(number)
    }
}

/// Fixed eight-column projection of a [`FlatMilestoneRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayRow([Cell; COLUMN_COUNT]);

impl DisplayRow {
    /// Returns the cells in column order.
    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    /// Returns the status cell.
    pub fn status(&self) -> &Cell {
        &self.0[STATUS_COLUMN]
    }

    /// Consumes the row and returns its cells.
    pub fn into_cells(self) -> Vec<Cell> {
        Vec::from(self.0)
    }
}

impl From<&FlatMilestoneRecord> for DisplayRow {
    fn from(record: &FlatMilestoneRecord) -> Self {
        to_display_row(record)
    }
}

/// Projects a record onto the eight display columns.
pub fn to_display_row(record: &FlatMilestoneRecord) -> DisplayRow {
    DisplayRow([
        Cell::from(record.project_name.clone()),
        Cell::from(record.phase_name.clone()),
        Cell::from(record.name.clone()),
        Cell::from(record.baseline_date.clone()),
        Cell::from(record.status().label()),
        Cell::from(record.planned_date.clone()),
        Cell::from(record.completion_date.clone()),
        Cell::from(record.total_delay.clone()),
    ])
}

/// Projects every record, keeping their order.
pub fn display_rows(records: &[FlatMilestoneRecord]) -> Vec<DisplayRow> {
    records.iter().map(to_display_row).collect()
}

/// Header row holding the column titles.
pub fn header_row() -> Vec<Cell> {
    COLUMN_HEADERS.iter().copied().map(Cell::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: Option<&str>) -> FlatMilestoneRecord {
        FlatMilestoneRecord {
            project_name: "A".into(),
            phase_name: "P1".into(),
            completion_date: None,
            total_delay: Number::from(2),
            name: "M1".into(),
            status: status.map(str::to_owned),
            baseline_date: Some("2023-12-01".into()),
            planned_date: Some("2023-12-15".into()),
        }
    }

    #[test]
    fn projects_columns_in_order() {
        let row = to_display_row(&record(Some("IP")));
        let json = serde_json::to_value(&row).expect("row serializes");
        assert_eq!(
            json,
            serde_json::json!([
                "A",
                "P1",
                "M1",
                "2023-12-01",
                "In Progress",
                "2023-12-15",
                null,
                2
            ])
        );
    }

    #[test]
    fn status_column_covers_both_branches() {
        assert_eq!(to_display_row(&record(Some("IP"))).status(), &Cell::from("In Progress"));
        for code in [Some("NS"), Some(""), Some("in-progress"), None] {
            assert_eq!(
                to_display_row(&record(code)).status(),
                &Cell::from("Not Started"),
                "code {code:?}"
            );
        }
    }

    #[test]
    fn header_row_matches_column_count() {
        let header = header_row();
        assert_eq!(header.len(), COLUMN_COUNT);
        assert_eq!(header[STATUS_COLUMN], Cell::from("Status"));
    }

    #[test]
    fn cells_round_trip_through_json() {
        let cells: Vec<Cell> =
            serde_json::from_str(r#"[null, -1.5, "text"]"#).expect("cells deserialize");
        assert!(cells[0].is_null());
        assert_eq!(cells[1].text(), "-1.5");
        assert_eq!(cells[2].to_string(), "text");
    }

    #[test]
    fn object_cells_keep_their_emphasis() {
        let cells: Vec<Cell> =
            serde_json::from_str(r#"[{"text": "Bold value", "bold": true}, "plain"]"#)
                .expect("cells deserialize");
        assert_eq!(cells[0].text(), "Bold value");
        assert_eq!(cells[0].emphasis().and_then(|cell| cell.bold), Some(true));
        assert!(cells[1].emphasis().is_none());
        assert_eq!(
            serde_json::to_value(&cells[0]).unwrap(),
            serde_json::json!({"text": "Bold value", "bold": true})
        );
    }
}
