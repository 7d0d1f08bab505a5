//! Schedule data as delivered by the planning service, and the flattening pass
//! that turns it into one record per milestone.
//!
//! The source JSON groups milestones by project phase:
//!
//! ```json
//! { "scheduleData": [ { "projectName": "A", "phaseName": "P1",
//!     "completionDate": "2024-01-01", "totalDelay": 2,
//!     "recentMilestones": [ { "name": "M1", "status": "IP",
//!         "baselineDate": "2023-12-01", "plannedDate": "2023-12-15",
//!         "completionDate": null } ] } ] }
//! ```
//!
//! Parsing goes through private mirror types whose fields are all optional, so
//! that an absent required field is reported with its exact position instead
//! of serde's generic message.

use std::fmt;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

use crate::error::{RecordLocation, ReportError, Result};

/// Status code used by the planning service for milestones in progress.
pub const IN_PROGRESS_CODE: &str = "IP";

/// Human-readable milestone status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MilestoneStatus {
    /// The milestone carries the `IP` status code.
    InProgress,
    /// Any other status code, including a missing one.
    NotStarted,
}

impl MilestoneStatus {
    /// Maps a raw status code to a status. Only the exact code `IP` counts as
    /// in progress.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(IN_PROGRESS_CODE) => Self::InProgress,
            _ => Self::NotStarted,
        }
    }

    /// Label shown in the status column.
    pub fn label(self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::NotStarted => "Not Started",
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Completion date as reported on a milestone event.
///
/// The source distinguishes between an event that does not mention a
/// completion date at all and one that explicitly reports `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompletionDate {
    /// The event has no `completionDate` key; the phase date applies.
    #[default]
    Inherit,
    /// The event reports `completionDate: null`.
    Pending,
    /// The event reports a completion date.
    Reached(String),
}

impl CompletionDate {
    /// Resolves the event value against the phase completion date.
    pub fn resolve(&self, phase: Option<&str>) -> Option<String> {
        match self {
            Self::Inherit => phase.map(str::to_owned),
            Self::Pending => None,
            Self::Reached(date) => Some(date.clone()),
        }
    }
}

impl From<Option<String>> for CompletionDate {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(date) => Self::Reached(date),
            None => Self::Pending,
        }
    }
}

/// A single milestone within a project phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MilestoneEvent {
    /// Milestone name.
    pub name: String,
    /// Raw status code, e.g. `IP`.
    pub status: Option<String>,
    /// Baseline date.
    pub baseline_date: Option<String>,
    /// Planned date.
    pub planned_date: Option<String>,
    /// Completion date as reported by the event.
    pub completion_date: CompletionDate,
}

impl MilestoneEvent {
    /// Creates an event with the given name and no other data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: None,
            baseline_date: None,
            planned_date: None,
            completion_date: CompletionDate::Inherit,
        }
    }

    /// Sets the raw status code and returns the updated event.
    pub fn with_status(mut self, status: impl Into<Option<String>>) -> Self {
        self.status = status.into();
        self
    }

    /// Sets the baseline date and returns the updated event.
    pub fn with_baseline_date(mut self, date: impl Into<Option<String>>) -> Self {
        self.baseline_date = date.into();
        self
    }

    /// Sets the planned date and returns the updated event.
    pub fn with_planned_date(mut self, date: impl Into<Option<String>>) -> Self {
        self.planned_date = date.into();
        self
    }

    /// Sets the completion date and returns the updated event.
    pub fn with_completion_date(mut self, date: impl Into<CompletionDate>) -> Self {
        self.completion_date = date.into();
        self
    }

    /// Returns the mapped status.
    pub fn status(&self) -> MilestoneStatus {
        MilestoneStatus::from_code(self.status.as_deref())
    }
}

/// Milestones of one project phase together with the phase summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleGroup {
    /// Project name.
    pub project_name: String,
    /// Phase name.
    pub phase_name: String,
    /// Phase completion date.
    pub completion_date: Option<String>,
    /// Accumulated delay of the phase, kept exactly as delivered.
    pub total_delay: Number,
    /// Milestones in source order.
    pub recent_milestones: Vec<MilestoneEvent>,
}

impl ScheduleGroup {
    /// Creates a group without milestones.
    pub fn new(
        project_name: impl Into<String>,
        phase_name: impl Into<String>,
        total_delay: impl Into<Number>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            phase_name: phase_name.into(),
            completion_date: None,
            total_delay: total_delay.into(),
            recent_milestones: Vec::new(),
        }
    }

    /// Sets the phase completion date and returns the updated group.
    pub fn with_completion_date(mut self, date: impl Into<Option<String>>) -> Self {
        self.completion_date = date.into();
        self
    }

    /// Appends a milestone and returns the updated group.
    pub fn with_milestone(mut self, milestone: MilestoneEvent) -> Self {
        self.recent_milestones.push(milestone);
        self
    }
}

/// One milestone together with the context of its phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatMilestoneRecord {
    /// Project name copied from the phase.
    pub project_name: String,
    /// Phase name copied from the phase.
    pub phase_name: String,
    /// Event completion date, or the phase date when the event has none.
    pub completion_date: Option<String>,
    /// Phase delay.
    pub total_delay: Number,
    /// Milestone name.
    pub name: String,
    /// Raw status code.
    pub status: Option<String>,
    /// Baseline date.
    pub baseline_date: Option<String>,
    /// Planned date.
    pub planned_date: Option<String>,
}

impl FlatMilestoneRecord {
    /// Merges a phase with one of its milestones. Event fields take
    /// precedence over phase fields of the same name.
    pub fn merge(group: &ScheduleGroup, event: &MilestoneEvent) -> Self {
        Self {
            project_name: group.project_name.clone(),
            phase_name: group.phase_name.clone(),
            completion_date: event
                .completion_date
                .resolve(group.completion_date.as_deref()),
            total_delay: group.total_delay.clone(),
            name: event.name.clone(),
            status: event.status.clone(),
            baseline_date: event.baseline_date.clone(),
            planned_date: event.planned_date.clone(),
        }
    }

    /// Returns the mapped status.
    pub fn status(&self) -> MilestoneStatus {
        MilestoneStatus::from_code(self.status.as_deref())
    }
}

/// Flattens the groups into one record per milestone, keeping group order and
/// milestone order within each group.
pub fn flatten(groups: &[ScheduleGroup]) -> Vec<FlatMilestoneRecord> {
    let records: Vec<_> = groups
        .iter()
        .flat_map(|group| {
            group
                .recent_milestones
                .iter()
                .map(move |event| FlatMilestoneRecord::merge(group, event))
        })
        .collect();

    debug!(
        "flattened {} schedule groups into {} milestone records",
        groups.len(),
        records.len()
    );
    records
}

/// The complete look-ahead dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LookAheadDataset {
    /// Schedule groups in source order.
    pub schedule_data: Vec<ScheduleGroup>,
}

impl LookAheadDataset {
    /// Creates a dataset from already validated groups.
    pub fn new(schedule_data: Vec<ScheduleGroup>) -> Self {
        Self { schedule_data }
    }

    /// Parses the dataset from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawDataset = serde_json::from_str(json).map_err(ReportError::Dataset)?;
        raw.validate()
    }

    /// Reads and parses the dataset from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Flattens the dataset into milestone records.
    pub fn records(&self) -> Vec<FlatMilestoneRecord> {
        flatten(&self.schedule_data)
    }

    /// Total number of milestones across all groups.
    pub fn milestone_count(&self) -> usize {
        self.schedule_data
            .iter()
            .map(|group| group.recent_milestones.len())
            .sum()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataset {
    schedule_data: Option<Vec<RawGroup>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGroup {
    project_name: Option<String>,
    phase_name: Option<String>,
    completion_date: Option<String>,
    total_delay: Option<Number>,
    recent_milestones: Option<Vec<RawMilestone>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMilestone {
    name: Option<String>,
    status: Option<String>,
    baseline_date: Option<String>,
    planned_date: Option<String>,
    #[serde(default, deserialize_with = "present_field")]
    completion_date: Option<Option<String>>,
}

/// Marks a field as present, even when its value is `null`. Combined with
/// `#[serde(default)]` an absent key stays `None`.
fn present_field<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn required<T>(value: Option<T>, location: RecordLocation, field: &'static str) -> Result<T> {
    value.ok_or(ReportError::MissingField { location, field })
}

impl RawDataset {
    fn validate(self) -> Result<LookAheadDataset> {
        let groups = required(self.schedule_data, RecordLocation::Dataset, "scheduleData")?;
        let schedule_data = groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| group.validate(index))
            .collect::<Result<Vec<_>>>()?;
        Ok(LookAheadDataset { schedule_data })
    }
}

impl RawGroup {
    fn validate(self, group: usize) -> Result<ScheduleGroup> {
        let location = RecordLocation::Group { group };
        let milestones = required(self.recent_milestones, location, "recentMilestones")?;
        Ok(ScheduleGroup {
            project_name: required(self.project_name, location, "projectName")?,
            phase_name: required(self.phase_name, location, "phaseName")?,
            completion_date: self.completion_date,
            total_delay: required(self.total_delay, location, "totalDelay")?,
            recent_milestones: milestones
                .into_iter()
                .enumerate()
                .map(|(milestone, raw)| raw.validate(group, milestone))
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

impl RawMilestone {
    fn validate(self, group: usize, milestone: usize) -> Result<MilestoneEvent> {
        let location = RecordLocation::Milestone { group, milestone };
        Ok(MilestoneEvent {
            name: required(self.name, location, "name")?,
            status: self.status,
            baseline_date: self.baseline_date,
            planned_date: self.planned_date,
            completion_date: match self.completion_date {
                None => CompletionDate::Inherit,
                Some(value) => CompletionDate::from(value),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(project: &str, phase: &str, milestones: &[&str]) -> ScheduleGroup {
        milestones.iter().fold(
            ScheduleGroup::new(project, phase, 0)
                .with_completion_date(Some("2024-06-30".to_string())),
            |acc, name| acc.with_milestone(MilestoneEvent::new(*name)),
        )
    }

    #[test]
    fn flatten_preserves_group_and_event_order() {
        let groups = vec![
            group("A", "P1", &["M1", "M2"]),
            group("B", "P2", &[]),
            group("C", "P3", &["M3"]),
        ];

        let names: Vec<_> = flatten(&groups)
            .into_iter()
            .map(|record| (record.project_name, record.name))
            .collect();

        assert_eq!(
            names,
            vec![
                ("A".to_string(), "M1".to_string()),
                ("A".to_string(), "M2".to_string()),
                ("C".to_string(), "M3".to_string()),
            ]
        );
    }

    #[test]
    fn event_completion_date_overrides_phase() {
        let phase = ScheduleGroup::new("A", "P1", 2)
            .with_completion_date(Some("2024-01-01".to_string()))
            .with_milestone(
                MilestoneEvent::new("reached").with_completion_date(Some("2023-12-20".to_string())),
            )
            .with_milestone(
                MilestoneEvent::new("pending").with_completion_date(CompletionDate::Pending),
            )
            .with_milestone(MilestoneEvent::new("silent"));

        let dates: Vec<_> = flatten(&[phase])
            .into_iter()
            .map(|record| record.completion_date)
            .collect();

        assert_eq!(
            dates,
            vec![
                Some("2023-12-20".to_string()),
                None,
                Some("2024-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn parse_distinguishes_null_from_absent_completion_date() {
        let dataset = LookAheadDataset::from_json(
            r#"{"scheduleData":[{"projectName":"A","phaseName":"P1",
                "completionDate":"2024-01-01","totalDelay":-3,
                "recentMilestones":[
                    {"name":"M1","status":"IP","completionDate":null},
                    {"name":"M2","status":"NS"}
                ]}]}"#,
        )
        .expect("dataset parses");

        let milestones = &dataset.schedule_data[0].recent_milestones;
        assert_eq!(milestones[0].completion_date, CompletionDate::Pending);
        assert_eq!(milestones[1].completion_date, CompletionDate::Inherit);
        assert_eq!(dataset.schedule_data[0].total_delay.to_string(), "-3");
    }

    #[test]
    fn missing_milestone_name_reports_position() {
        let err = LookAheadDataset::from_json(
            r#"{"scheduleData":[
                {"projectName":"A","phaseName":"P1","totalDelay":0,"recentMilestones":[]},
                {"projectName":"B","phaseName":"P2","totalDelay":0,
                 "recentMilestones":[{"name":"ok"},{"status":"IP"}]}
            ]}"#,
        )
        .unwrap_err();

        match err {
            ReportError::MissingField { location, field } => {
                assert_eq!(
                    location,
                    RecordLocation::Milestone {
                        group: 1,
                        milestone: 1
                    }
                );
                assert_eq!(field, "name");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_group_fields_fail_fast() {
        let err = LookAheadDataset::from_json(
            r#"{"scheduleData":[{"projectName":"A","phaseName":"P1","recentMilestones":[]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingField {
                location: RecordLocation::Group { group: 0 },
                field: "totalDelay"
            }
        ));

        let err = LookAheadDataset::from_json(r#"{"data":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingField {
                location: RecordLocation::Dataset,
                field: "scheduleData"
            }
        ));
    }

    #[test]
    fn status_mapping_is_exact() {
        assert_eq!(MilestoneStatus::from_code(Some("IP")), MilestoneStatus::InProgress);
        assert_eq!(MilestoneStatus::from_code(Some("ip")), MilestoneStatus::NotStarted);
        assert_eq!(MilestoneStatus::from_code(Some("NS")), MilestoneStatus::NotStarted);
        assert_eq!(MilestoneStatus::from_code(None), MilestoneStatus::NotStarted);
        assert_eq!(MilestoneStatus::InProgress.to_string(), "In Progress");
    }
}
