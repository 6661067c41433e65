//! Mood log and wellness points

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Points awarded for a rating at or above [`MoodRating::Happy`]
pub const POSITIVE_MOOD_POINTS: u32 = 20;
/// Points awarded for any other rating
pub const OTHER_MOOD_POINTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MoodRating {
    VerySad = 1,
    Sad = 2,
    Neutral = 3,
    Happy = 4,
    VeryHappy = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Mood rating must be between 1 and 5, got {0}")]
pub struct InvalidMoodRating(pub u8);

impl MoodRating {
    pub const ALL: [MoodRating; 5] = [
        MoodRating::VerySad,
        MoodRating::Sad,
        MoodRating::Neutral,
        MoodRating::Happy,
        MoodRating::VeryHappy,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            MoodRating::VerySad => "Very Sad",
            MoodRating::Sad => "Sad",
            MoodRating::Neutral => "Neutral",
            MoodRating::Happy => "Happy",
            MoodRating::VeryHappy => "Very Happy",
        }
    }

    pub fn is_positive(self) -> bool {
        self >= MoodRating::Happy
    }

    /// Wellness points earned by logging this rating
    pub fn points(self) -> u32 {
        if self.is_positive() {
            POSITIVE_MOOD_POINTS
        } else {
            OTHER_MOOD_POINTS
        }
    }
}

impl TryFrom<u8> for MoodRating {
    type Error = InvalidMoodRating;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        MoodRating::ALL
            .into_iter()
            .find(|rating| rating.value() == value)
            .ok_or(InvalidMoodRating(value))
    }
}

impl From<MoodRating> for u8 {
    fn from(rating: MoodRating) -> Self {
        rating.value()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub rating: MoodRating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
}

impl MoodEntry {
    pub fn new(rating: MoodRating, journal: Option<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: format!("mood-{}", uuid::Uuid::new_v4()),
            date,
            rating,
            journal: journal.filter(|text| !text.trim().is_empty()),
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Record `entry`, replacing any entry already logged on the same UTC day.
/// Returns true when an earlier entry was replaced.
pub fn record(entries: &mut Vec<MoodEntry>, entry: MoodEntry) -> bool {
    let day = entry.day();
    match entries.iter_mut().find(|existing| existing.day() == day) {
        Some(existing) => {
            *existing = entry;
            true
        }
        None => {
            entries.push(entry);
            false
        }
    }
}

pub fn entry_for_day(entries: &[MoodEntry], day: NaiveDate) -> Option<&MoodEntry> {
    entries.iter().find(|entry| entry.day() == day)
}
