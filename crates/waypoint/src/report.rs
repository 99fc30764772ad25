//! Run-scoped result accumulation.
//!
//! Results are keyed by external test-case id. A scenario covering several
//! cases records the same outcome under each; a later record for the same
//! case replaces the earlier one. Status ids follow the TestRail convention
//! (`1` passed, `5` failed) so a report can be uploaded as-is.

use crate::result::{WaypointError, WaypointResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

/// Case outcome, serialized as its TestRail status id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CaseStatus {
    /// Status id 1
    Passed,
    /// Status id 5
    Failed,
}

impl CaseStatus {
    /// TestRail status id
    #[must_use]
    pub const fn status_id(self) -> u8 {
        match self {
            Self::Passed => 1,
            Self::Failed => 5,
        }
    }

    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl From<CaseStatus> for u8 {
    fn from(status: CaseStatus) -> Self {
        status.status_id()
    }
}

impl TryFrom<u8> for CaseStatus {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Self::Passed),
            5 => Ok(Self::Failed),
            other => Err(format!("unsupported status id {other}")),
        }
    }
}

/// Result recorded for one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Scenario that produced the result
    pub scenario: String,
    /// Outcome
    pub status: CaseStatus,
    /// "Test passed" or the failure description
    pub comment: String,
    /// Wall time of the scenario in seconds
    pub duration_s: f64,
}

/// Results of one suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run id
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Results by case id
    pub results: BTreeMap<u64, CaseResult>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    /// Start an empty report
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            results: BTreeMap::new(),
        }
    }

    /// Record a scenario outcome under each of its case ids
    ///
    /// A case shared by several scenarios keeps its first failure; a later
    /// pass does not overwrite it.
    pub fn record(
        &mut self,
        scenario: &str,
        case_ids: &[u64],
        outcome: &WaypointResult<()>,
        duration: Duration,
    ) {
        let (status, comment) = match outcome {
            Ok(()) => (CaseStatus::Passed, "Test passed".to_string()),
            Err(e) => (CaseStatus::Failed, e.to_string()),
        };
        for &case_id in case_ids {
            if status.is_passed()
                && self.results.get(&case_id).is_some_and(|r| !r.status.is_passed())
            {
                continue;
            }
            let _ = self.results.insert(
                case_id,
                CaseResult {
                    scenario: scenario.to_string(),
                    status,
                    comment: comment.clone(),
                    duration_s: duration.as_secs_f64(),
                },
            );
        }
    }

    /// Result for `case_id`
    #[must_use]
    pub fn get(&self, case_id: u64) -> Option<&CaseResult> {
        self.results.get(&case_id)
    }

    /// Number of recorded cases
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Passed case count
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.status.is_passed())
            .count()
    }

    /// Failed case count
    #[must_use]
    pub fn failed(&self) -> usize {
        self.len() - self.passed()
    }

    /// Ids of failed cases in ascending order
    pub fn failed_cases(&self) -> impl Iterator<Item = u64> + '_ {
        self.results
            .iter()
            .filter(|(_, r)| !r.status.is_passed())
            .map(|(&id, _)| id)
    }

    /// Whether every recorded case passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> WaypointResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn save(&self, path: &Path) -> WaypointResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a saved report
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> WaypointResult<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(WaypointError::from)
    }
}
