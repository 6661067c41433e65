//! Seed data standing in for an institution's records

use super::academics::{Assignment, AssignmentStatus, SemesterGpa};
use super::faculty::{FacultyNote, FlaggedStudentSummary, NotesBook};
use super::mood::{MoodEntry, MoodRating};
use super::student::StudentRecord;
use super::{MemberStatus, Nudge, NudgeKind, RosterEntry};
use crate::identity::Role;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;

pub const CHAT_SUGGESTIONS: [&str; 4] = [
    "I'm feeling overwhelmed.",
    "Tell me a breathing exercise.",
    "Help me with study tips.",
    "I need to talk to someone.",
];

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn midnight(year: i32, month: u32, dom: u32) -> DateTime<Utc> {
    day(year, month, dom).and_time(NaiveTime::MIN).and_utc()
}

fn assignment(
    id: &str,
    name: &str,
    due: NaiveDate,
    submitted: Option<NaiveDate>,
    status: AssignmentStatus,
) -> Assignment {
    Assignment {
        id: id.to_string(),
        name: name.to_string(),
        due_date: due,
        submitted_date: submitted,
        status,
    }
}

fn mood(id: &str, date: DateTime<Utc>, rating: MoodRating, journal: Option<&str>) -> MoodEntry {
    MoodEntry {
        id: id.to_string(),
        date,
        rating,
        journal: journal.map(str::to_string),
    }
}

fn gpa(semester: &str, gpa: f64) -> SemesterGpa {
    SemesterGpa {
        semester: semester.to_string(),
        gpa,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

/// The record shown on a student's own dashboard
pub fn primary_student() -> StudentRecord {
    StudentRecord {
        id: "student123".to_string(),
        name: "Alex Doe".to_string(),
        avatar_url: "https://picsum.photos/seed/student123/100/100".to_string(),
        wellness_points: 1250,
        gpa_history: vec![
            gpa("Fall 2022", 3.5),
            gpa("Spring 2023", 3.2),
            gpa("Fall 2023", 2.8),
            gpa("Spring 2024", 3.0),
        ],
        assignments: vec![
            assignment("a1", "Calculus HW 1", day(2024, 3, 1), Some(day(2024, 3, 1)), AssignmentStatus::Submitted),
            assignment("a2", "History Essay", day(2024, 3, 5), Some(day(2024, 3, 7)), AssignmentStatus::Late),
            assignment("a3", "Physics Lab Report", day(2024, 3, 10), None, AssignmentStatus::Missed),
            assignment("a4", "Calculus HW 2", day(2024, 3, 15), Some(day(2024, 3, 14)), AssignmentStatus::Submitted),
            assignment("a5", "Literature Review", day(2024, 4, 1), None, AssignmentStatus::Pending),
        ],
        mood_entries: vec![
            mood("m1", midnight(2024, 3, 1), MoodRating::Happy, Some("Felt good after finishing calculus hw.")),
            mood("m2", midnight(2024, 3, 5), MoodRating::Neutral, Some("Stressed about the history essay.")),
            mood("m3", midnight(2024, 3, 10), MoodRating::Sad, Some("Missed the physics lab, feeling down.")),
            mood("m4", midnight(2024, 3, 15), MoodRating::Happy, Some("Did well on the next HW.")),
            mood("m5", midnight(2024, 4, 1), MoodRating::Neutral, None),
        ],
        risk_score: Some(65),
        risk_factors: strings(&[
            "Noticeable drop in GPA in Fall 2023.",
            "Pattern of late/missed assignments (History Essay, Physics Lab).",
            "Self-reported sad mood on 2024-03-10.",
        ]),
    }
}

fn low_risk_student() -> StudentRecord {
    StudentRecord {
        id: "student456".to_string(),
        name: "Jamie Lee".to_string(),
        avatar_url: "https://picsum.photos/seed/student456/100/100".to_string(),
        wellness_points: 2500,
        gpa_history: vec![
            gpa("Fall 2022", 3.8),
            gpa("Spring 2023", 3.9),
            gpa("Fall 2023", 3.7),
            gpa("Spring 2024", 3.8),
        ],
        assignments: vec![
            assignment("b1", "Biology Report", day(2024, 3, 1), Some(day(2024, 3, 1)), AssignmentStatus::Submitted),
            assignment("b2", "Chemistry Presentation", day(2024, 3, 15), Some(day(2024, 3, 14)), AssignmentStatus::Submitted),
        ],
        mood_entries: vec![mood(
            "n1",
            midnight(2024, 4, 1),
            MoodRating::VeryHappy,
            Some("Feeling great this month!"),
        )],
        risk_score: Some(15),
        risk_factors: strings(&[
            "Consistently high academic performance.",
            "Positive mood entries.",
        ]),
    }
}

pub fn flagged_students() -> Vec<FlaggedStudentSummary> {
    let summary = |id: &str, pseudonym: &str, risk: u8, concern: &str, last: MoodRating| {
        FlaggedStudentSummary {
            student_id: id.to_string(),
            pseudonym: pseudonym.to_string(),
            risk_score: risk,
            primary_concern: concern.to_string(),
            last_mood: Some(last),
        }
    };
    vec![
        summary("student123_anon", "Student Alpha", 65, "Declining GPA & Missed Work", MoodRating::Sad),
        summary("student789_anon", "Student Beta", 80, "High assignment irregularity", MoodRating::Neutral),
        summary("student001_anon", "Student Gamma", 55, "Slight dip in performance", MoodRating::Happy),
    ]
}

/// Full record behind a flagged summary, looked up by anonymized id
pub fn student_detail(student_id: &str) -> Option<StudentRecord> {
    match student_id {
        "student123_anon" => Some(primary_student()),
        "student789_anon" => {
            let mut student = low_risk_student();
            student.id = student_id.to_string();
            student.name = "Student Beta (Pseudonym)".to_string();
            student.risk_score = Some(80);
            student.risk_factors = strings(&[
                "Multiple consecutive missed assignments",
                "No recent mood logs",
                "Significant GPA drop last semester",
            ]);
            student.assignments.extend([
                assignment("c1", "Project Proposal", day(2024, 3, 20), None, AssignmentStatus::Missed),
                assignment("c2", "Midterm Exam", day(2024, 3, 25), None, AssignmentStatus::Missed),
            ]);
            student.gpa_history = primary_student().gpa_history;
            Some(student)
        }
        "student001_anon" => {
            let mut student = low_risk_student();
            student.id = student_id.to_string();
            student.name = "Student Gamma (Pseudonym)".to_string();
            student.risk_score = Some(55);
            student.risk_factors = strings(&["Slight dip in last quiz score", "One late assignment"]);
            Some(student)
        }
        _ => None,
    }
}

pub fn initial_notes() -> NotesBook {
    let note = |id: &str, at: DateTime<Utc>, text: &str, author: &str| FacultyNote {
        id: id.to_string(),
        timestamp: at,
        text: text.to_string(),
        author: author.to_string(),
    };

    let mut notes = HashMap::new();
    notes.insert(
        "student123_anon".to_string(),
        vec![
            note("fn1", midnight(2024, 4, 2), "Reached out via email to check in. Offered resources.", "Dr. Smith"),
            note("fn2", midnight(2024, 4, 5), "Student scheduled a meeting for next week.", "Dr. Smith"),
        ],
    );
    notes.insert(
        "student789_anon".to_string(),
        vec![note(
            "fn3",
            midnight(2024, 4, 3),
            "Discussed time management strategies during office hours.",
            "Prof. Jones",
        )],
    );
    NotesBook::new(notes)
}

pub fn nudges() -> Vec<Nudge> {
    let nudge = |id: &str, title: &str, content: &str, kind: NudgeKind| Nudge {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        kind,
    };
    vec![
        nudge(
            "n1",
            "Study Tip: Pomodoro Technique",
            "Try studying in 25-minute focused intervals with 5-minute breaks. It can boost concentration!",
            NudgeKind::Study,
        ),
        nudge(
            "n2",
            "Mindfulness Moment: Box Breathing",
            "Inhale for 4s, hold for 4s, exhale for 4s, hold for 4s. Repeat for a few minutes to calm your mind.",
            NudgeKind::Mindfulness,
        ),
        nudge(
            "n3",
            "Quick Activity: Stretch Break",
            "Stand up and stretch for 5 minutes. It helps with focus and energy levels.",
            NudgeKind::Activity,
        ),
        nudge(
            "n4",
            "Campus Resource: Counseling Center",
            "Remember, the university counseling center offers free and confidential support. Room 302, Student Union.",
            NudgeKind::Resource,
        ),
    ]
}

pub fn admin_roster() -> Vec<RosterEntry> {
    let member = |id: &str, name: &str, email: &str, role: Role, status: MemberStatus| RosterEntry {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        status,
    };
    vec![
        member("userStudent", "Student User", "student@example.com", Role::Student, MemberStatus::Active),
        member("userFaculty", "Dr. Faculty", "faculty@example.com", Role::Faculty, MemberStatus::Active),
        member("userAdmin", "Admin User", "admin@example.com", Role::Admin, MemberStatus::Active),
        member("userNew", "Pending User", "new@example.com", Role::Student, MemberStatus::Pending),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_flagged_student_has_detail() {
        for summary in flagged_students() {
            let detail = student_detail(&summary.student_id)
                .unwrap_or_else(|| panic!("missing detail for {}", summary.student_id));
            assert_eq!(detail.risk_score, Some(summary.risk_score));
        }
        assert!(student_detail("student999_anon").is_none());
    }

    #[test]
    fn test_beta_detail_adds_missed_work() {
        let beta = student_detail("student789_anon").unwrap();
        assert_eq!(beta.assignment_summary().missed, 2);
        assert_eq!(beta.gpa_history, primary_student().gpa_history);
    }

    #[test]
    fn test_seed_dates() {
        let alex = primary_student();
        assert_eq!(alex.mood_entries[2].day(), day(2024, 3, 10));
        assert_eq!(initial_notes().for_student("student123_anon").len(), 2);
    }
}
