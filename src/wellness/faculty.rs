//! Faculty view: flagged students and follow-up notes

use super::mood::MoodRating;
use super::WellnessError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Author recorded when the signed-in identity has no display name
pub const DEFAULT_NOTE_AUTHOR: &str = "Faculty Member";

/// A student surfaced by the early-warning list; ids are anonymized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedStudentSummary {
    pub student_id: String,
    pub pseudonym: String,
    pub risk_score: u8,
    pub primary_concern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_mood: Option<MoodRating>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyNote {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub author: String,
}

/// Notes per anonymized student id, oldest first
#[derive(Debug, Clone, Default)]
pub struct NotesBook {
    notes: HashMap<String, Vec<FacultyNote>>,
}

impl NotesBook {
    pub fn new(notes: HashMap<String, Vec<FacultyNote>>) -> Self {
        Self { notes }
    }

    pub fn for_student(&self, student_id: &str) -> &[FacultyNote] {
        self.notes.get(student_id).map_or(&[], Vec::as_slice)
    }

    pub fn add(
        &mut self,
        student_id: &str,
        text: &str,
        author: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FacultyNote, WellnessError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WellnessError::EmptyNote);
        }

        let author = author
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_NOTE_AUTHOR);
        let note = FacultyNote {
            id: format!("note-{}", uuid::Uuid::new_v4()),
            timestamp: now,
            text: text.to_string(),
            author: author.to_string(),
        };

        tracing::info!(student_id, author, "Faculty note added");
        self.notes
            .entry(student_id.to_string())
            .or_default()
            .push(note.clone());
        Ok(note)
    }
}
