//! Student wellness data behind the dashboards
//!
//! Mood logging, assignment and GPA summaries, faculty notes, and the
//! seed records everything starts from. All of it is in memory.

mod academics;
mod faculty;
pub mod fixtures;
mod mood;
mod student;

pub use academics::{AssignmentSummary, GpaTrend};
pub use faculty::{FacultyNote, FlaggedStudentSummary};
pub use mood::{MoodEntry, MoodRating};
pub use student::{MoodSubmission, StudentRecord};

use crate::identity::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use faculty::NotesBook;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WellnessError {
    #[error("Note text cannot be empty")]
    EmptyNote,
    #[error("No student with id {0}")]
    UnknownStudent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NudgeKind {
    Study,
    Mindfulness,
    Activity,
    Resource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nudge {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: NudgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    Active,
    Pending,
}

/// A member of the organization as listed on the admin panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: MemberStatus,
}

/// One choice on the mood form
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MoodOption {
    pub rating: MoodRating,
    pub label: &'static str,
}

/// Everything the student dashboard shows
#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub student: StudentRecord,
    pub today_mood: Option<MoodEntry>,
    pub mood_options: Vec<MoodOption>,
    pub assignment_summary: AssignmentSummary,
    pub gpa_trend: Option<GpaTrend>,
    pub nudges: Vec<Nudge>,
}

/// A flagged student's record together with faculty notes
#[derive(Debug, Clone, Serialize)]
pub struct StudentDetail {
    pub student: StudentRecord,
    pub assignment_summary: AssignmentSummary,
    pub gpa_trend: Option<GpaTrend>,
    pub notes: Vec<FacultyNote>,
}

/// In-memory wellness state shared by the dashboards
#[derive(Debug, Clone)]
pub struct WellnessBoard {
    /// Student records keyed by identity id, seeded on first access
    students: HashMap<String, StudentRecord>,
    flagged: Vec<FlaggedStudentSummary>,
    notes: NotesBook,
}

impl WellnessBoard {
    pub fn seeded() -> Self {
        Self {
            students: HashMap::new(),
            flagged: fixtures::flagged_students(),
            notes: fixtures::initial_notes(),
        }
    }

    fn student_mut(&mut self, identity_id: &str) -> &mut StudentRecord {
        self.students
            .entry(identity_id.to_string())
            .or_insert_with(fixtures::primary_student)
    }

    pub fn student_dashboard(&mut self, identity_id: &str, now: DateTime<Utc>) -> StudentDashboard {
        let student = self.student_mut(identity_id).clone();
        StudentDashboard {
            today_mood: student.mood_for_day(now.date_naive()).cloned(),
            mood_options: MoodRating::ALL
                .into_iter()
                .map(|rating| MoodOption {
                    rating,
                    label: rating.label(),
                })
                .collect(),
            assignment_summary: student.assignment_summary(),
            gpa_trend: student.gpa_trend(),
            nudges: fixtures::nudges(),
            student,
        }
    }

    pub fn submit_mood(
        &mut self,
        identity_id: &str,
        rating: MoodRating,
        journal: Option<String>,
        now: DateTime<Utc>,
    ) -> MoodSubmission {
        self.student_mut(identity_id).submit_mood(rating, journal, now)
    }

    pub fn flagged(&self) -> &[FlaggedStudentSummary] {
        &self.flagged
    }

    pub fn student_detail(&self, student_id: &str) -> Result<StudentDetail, WellnessError> {
        let student = fixtures::student_detail(student_id)
            .ok_or_else(|| WellnessError::UnknownStudent(student_id.to_string()))?;
        Ok(StudentDetail {
            assignment_summary: student.assignment_summary(),
            gpa_trend: student.gpa_trend(),
            notes: self.notes.for_student(student_id).to_vec(),
            student,
        })
    }

    pub fn add_note(
        &mut self,
        student_id: &str,
        text: &str,
        author: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FacultyNote, WellnessError> {
        if !self.flagged.iter().any(|s| s.student_id == student_id) {
            return Err(WellnessError::UnknownStudent(student_id.to_string()));
        }
        self.notes.add(student_id, text, author, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_per_identity() {
        let mut board = WellnessBoard::seeded();
        let now = Utc::now();

        let before = board.student_dashboard("user-a", now);
        assert!(before.today_mood.is_none());
        assert_eq!(before.nudges.len(), 4);
        assert_eq!(before.mood_options.len(), 5);
        assert_eq!(before.mood_options[3].label, "Happy");

        board.submit_mood("user-a", MoodRating::Happy, None, now);
        let after = board.student_dashboard("user-a", now);
        assert_eq!(after.today_mood.map(|m| m.rating), Some(MoodRating::Happy));
        assert_eq!(
            after.student.wellness_points,
            before.student.wellness_points + 20
        );

        let other = board.student_dashboard("user-b", now);
        assert!(other.today_mood.is_none());
    }

    #[test]
    fn test_notes_show_in_detail() {
        let mut board = WellnessBoard::seeded();
        board
            .add_note("student001_anon", "Suggested tutoring.", Some("Dr. Faculty"), Utc::now())
            .unwrap();

        let detail = board.student_detail("student001_anon").unwrap();
        assert_eq!(detail.notes.len(), 1);
        assert_eq!(detail.notes[0].author, "Dr. Faculty");

        assert_eq!(
            board.student_detail("nobody").unwrap_err(),
            WellnessError::UnknownStudent("nobody".into())
        );
        assert!(board.add_note("nobody", "hi", None, Utc::now()).is_err());
    }

    #[test]
    fn test_nudge_wire_shape() {
        let json = serde_json::to_value(&fixtures::nudges()[1]).unwrap();
        assert_eq!(json["type"], "mindfulness");
    }
}
