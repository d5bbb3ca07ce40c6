use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LESSONS_BATCH_SIZE, DEFAULT_LESSONS_PER_DAY};

/// Selects which timing table governs every card of a deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingVariant {
    #[default]
    Default,
    Demo,
}

impl TimingVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            TimingVariant::Default => "default",
            TimingVariant::Demo => "demo",
        }
    }
}

impl fmt::Display for TimingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown srs timings type '{0}', expected 'default' or 'demo'")]
pub struct UnknownTimingVariant(pub String);

impl FromStr for TimingVariant {
    type Err = UnknownTimingVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(TimingVariant::Default),
            "demo" => Ok(TimingVariant::Demo),
            other => Err(UnknownTimingVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: String,
    pub deck_id: String,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// 0 until the card has been through a lesson, never below 1 afterwards.
    pub level: u32,
    pub learned_date: Option<DateTime<Utc>>,
    pub next_review_date: Option<DateTime<Utc>>,
    pub retired: bool,
    pub created_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn new(deck_id: &str, front: &str, back: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            deck_id: deck_id.to_string(),
            front: front.to_string(),
            back: back.to_string(),
            notes: None,
            level: 0,
            learned_date: None,
            next_review_date: None,
            retired: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_lesson(&self) -> bool {
        self.level == 0 && !self.retired
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.retired && self.next_review_date.is_some_and(|due| due <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub pathname: String,
    #[serde(default)]
    pub description: Option<String>,
    pub lessons_per_day: u32,
    pub lessons_batch_size: u32,
    #[serde(default)]
    pub srs_timings_type: TimingVariant,
    pub created_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(name: &str, srs_timings_type: TimingVariant) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            pathname: pathname_for(name),
            description: None,
            lessons_per_day: DEFAULT_LESSONS_PER_DAY,
            lessons_batch_size: DEFAULT_LESSONS_BATCH_SIZE,
            srs_timings_type,
            created_at: Utc::now(),
        }
    }
}

/// Kebab-cased, url-friendly form of a deck name.
pub fn pathname_for(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_lower = false;
    let mut pending_dash = false;

    for ch in name.trim().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_dash = !out.is_empty();
            prev_lower = false;
            continue;
        }
        if (pending_dash || (prev_lower && ch.is_uppercase())) && !out.ends_with('-') {
            out.push('-');
        }
        pending_dash = false;
        prev_lower = ch.is_lowercase();
        out.extend(ch.to_lowercase());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_variant_parses_and_serializes_lowercase() {
        assert_eq!("demo".parse::<TimingVariant>().unwrap(), TimingVariant::Demo);
        assert_eq!(" Default ".parse::<TimingVariant>().unwrap(), TimingVariant::Default);
        assert!("weekly".parse::<TimingVariant>().is_err());
        assert_eq!(
            serde_json::to_string(&TimingVariant::Demo).unwrap(),
            "\"demo\""
        );
    }

    #[test]
    fn pathname_is_kebab_cased() {
        assert_eq!(pathname_for("Japanese Vocab"), "japanese-vocab");
        assert_eq!(pathname_for("  myDeck_two "), "my-deck-two");
        assert_eq!(pathname_for("a  -  b"), "a-b");
    }

    #[test]
    fn new_card_is_a_lesson_and_never_due() {
        let card = Flashcard::new("d1", "arbre", "tree");
        assert!(card.is_lesson());
        assert!(!card.is_due(Utc::now()));
    }

    #[test]
    fn retired_card_is_not_due() {
        let mut card = Flashcard::new("d1", "arbre", "tree");
        card.level = 9;
        card.retired = true;
        card.next_review_date = Some(Utc::now() - chrono::Duration::hours(1));
        assert!(!card.is_due(Utc::now()));
        assert!(!card.is_lesson());
    }
}
