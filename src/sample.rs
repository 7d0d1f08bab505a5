//! Bundled look-ahead dataset used by the CLI and the tests.

use crate::error::Result;
use crate::schedule::LookAheadDataset;

/// Raw JSON of the bundled dataset.
pub const SAMPLE_DATASET: &str = include_str!("../assets/look_ahead_sample.json");

/// Parses the bundled dataset.
pub fn sample_dataset() -> Result<LookAheadDataset> {
    LookAheadDataset::from_json(SAMPLE_DATASET)
}
