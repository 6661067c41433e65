//! Per-student wellness record

use super::academics::{gpa_trend, Assignment, AssignmentSummary, GpaTrend, SemesterGpa};
use super::mood::{self, MoodEntry, MoodRating};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
    pub wellness_points: u32,
    pub gpa_history: Vec<SemesterGpa>,
    pub assignments: Vec<Assignment>,
    pub mood_entries: Vec<MoodEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

/// Result of logging a mood
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodSubmission {
    pub entry: MoodEntry,
    pub points_awarded: u32,
    pub wellness_points: u32,
    /// An entry for the same day existed and was replaced
    pub replaced: bool,
}

impl StudentRecord {
    /// Log a mood at `now`. Points are awarded on every submission,
    /// including one that replaces the day's earlier entry.
    pub fn submit_mood(
        &mut self,
        rating: MoodRating,
        journal: Option<String>,
        now: DateTime<Utc>,
    ) -> MoodSubmission {
        let entry = MoodEntry::new(rating, journal, now);
        let replaced = mood::record(&mut self.mood_entries, entry.clone());
        let points_awarded = rating.points();
        self.wellness_points = self.wellness_points.saturating_add(points_awarded);

        tracing::info!(
            student_id = %self.id,
            rating = rating.value(),
            points = points_awarded,
            replaced,
            "Mood logged"
        );

        MoodSubmission {
            entry,
            points_awarded,
            wellness_points: self.wellness_points,
            replaced,
        }
    }

    pub fn mood_for_day(&self, day: NaiveDate) -> Option<&MoodEntry> {
        mood::entry_for_day(&self.mood_entries, day)
    }

    pub fn assignment_summary(&self) -> AssignmentSummary {
        AssignmentSummary::from_assignments(&self.assignments)
    }

    pub fn gpa_trend(&self) -> Option<GpaTrend> {
        gpa_trend(&self.gpa_history)
    }
}
