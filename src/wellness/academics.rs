//! Assignment and GPA summaries for the student dashboard

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Submitted,
    Late,
    Missed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub name: String,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_date: Option<NaiveDate>,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentSummary {
    pub submitted: usize,
    pub late: usize,
    pub missed: usize,
    pub pending: usize,
}

impl AssignmentSummary {
    pub fn from_assignments(assignments: &[Assignment]) -> Self {
        assignments
            .iter()
            .fold(Self::default(), |mut summary, assignment| {
                match assignment.status {
                    AssignmentStatus::Submitted => summary.submitted += 1,
                    AssignmentStatus::Late => summary.late += 1,
                    AssignmentStatus::Missed => summary.missed += 1,
                    AssignmentStatus::Pending => summary.pending += 1,
                }
                summary
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterGpa {
    pub semester: String,
    pub gpa: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Steady,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpaTrend {
    pub latest: f64,
    /// Change from the previous semester; zero with a single semester
    pub delta: f64,
    pub direction: TrendDirection,
}

const STEADY_EPSILON: f64 = 0.005;

/// Latest semester against the one before it; `None` with no history
pub fn gpa_trend(history: &[SemesterGpa]) -> Option<GpaTrend> {
    let (latest, earlier) = history.split_last()?;
    let delta = earlier.last().map_or(0.0, |previous| latest.gpa - previous.gpa);
    let direction = if delta > STEADY_EPSILON {
        TrendDirection::Rising
    } else if delta < -STEADY_EPSILON {
        TrendDirection::Falling
    } else {
        TrendDirection::Steady
    };

    Some(GpaTrend {
        latest: latest.gpa,
        delta: (delta * 100.0).round() / 100.0,
        direction,
    })
}
