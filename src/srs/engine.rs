use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::timing::timing_for;
use super::types::{Flashcard, TimingVariant};

/// Levels at or above this lose twice as much per mistake.
pub const PENALTY_THRESHOLD_LEVEL: u32 = 5;
const HIGH_LEVEL_PENALTY_FACTOR: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsOutcome {
    pub next_level: u32,
    #[serde(with = "optional_millis")]
    pub next_timing: Option<Duration>,
    pub is_retired: bool,
}

impl SrsOutcome {
    pub fn next_review_date(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.next_timing.map(|timing| now + timing)
    }
}

/// Level after a completed attempt. Every two mistakes (rounded up) cost one
/// level, doubled from [`PENALTY_THRESHOLD_LEVEL`]; a learned card never
/// drops below level 1.
pub fn next_level(current_level: u32, incorrect_count: u32) -> u32 {
    let incorrect_adjustment = incorrect_count.div_ceil(2);
    let penalty_factor = if current_level >= PENALTY_THRESHOLD_LEVEL {
        HIGH_LEVEL_PENALTY_FACTOR
    } else {
        1
    };

    current_level
        .saturating_add(1)
        .saturating_sub(incorrect_adjustment.saturating_mul(penalty_factor))
        .max(1)
}

pub fn compute_next_state(
    variant: TimingVariant,
    current_level: u32,
    incorrect_count: u32,
) -> SrsOutcome {
    let next_level = next_level(current_level, incorrect_count);
    let next_timing = timing_for(variant, next_level);

    SrsOutcome {
        next_level,
        next_timing,
        is_retired: next_timing.is_none(),
    }
}

/// First-time learning: a lesson card goes from level 0 to level 1.
pub fn promote_lesson(variant: TimingVariant) -> SrsOutcome {
    compute_next_state(variant, 0, 0)
}

impl Flashcard {
    pub fn apply_outcome(&mut self, outcome: &SrsOutcome, now: DateTime<Utc>) {
        self.level = outcome.next_level;
        self.next_review_date = outcome.next_review_date(now);
        self.retired = outcome.is_retired;
        if self.learned_date.is_none() {
            self.learned_date = Some(now);
        }
    }
}

mod optional_millis {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.num_milliseconds()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(d)?.map(Duration::milliseconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::timing::max_level;

    #[test]
    fn correct_answer_moves_up_one_level() {
        let outcome = compute_next_state(TimingVariant::Default, 3, 0);
        assert_eq!(outcome.next_level, 4);
        assert_eq!(outcome.next_timing, Some(Duration::days(2)));
        assert!(!outcome.is_retired);
    }

    #[test]
    fn mistakes_round_up_in_pairs() {
        // 1 or 2 mistakes cost one level below level 5.
        assert_eq!(next_level(3, 1), 3);
        assert_eq!(next_level(3, 2), 3);
        assert_eq!(next_level(3, 3), 2);
        assert_eq!(next_level(3, 4), 2);
    }

    #[test]
    fn high_levels_are_penalized_twice() {
        assert_eq!(next_level(4, 1), 4);
        assert_eq!(next_level(5, 1), 4);
        assert_eq!(next_level(8, 3), 5);
    }

    #[test]
    fn level_never_drops_below_one() {
        assert_eq!(next_level(1, 10), 1);
        assert_eq!(next_level(6, 40), 1);
        assert_eq!(next_level(2, u32::MAX), 1);
    }

    #[test]
    fn lesson_promotion_lands_on_level_one() {
        for variant in [TimingVariant::Default, TimingVariant::Demo] {
            let outcome = promote_lesson(variant);
            assert_eq!(outcome.next_level, 1);
            assert_eq!(outcome.next_timing, timing_for(variant, 1));
            assert!(!outcome.is_retired);
        }
    }

    #[test]
    fn clearing_the_last_timed_level_retires() {
        let outcome = compute_next_state(TimingVariant::Default, 8, 0);
        assert_eq!(outcome.next_level, max_level(TimingVariant::Default));
        assert!(outcome.is_retired);
        assert_eq!(outcome.next_timing, None);

        let past_max = compute_next_state(TimingVariant::Default, 9, 0);
        assert_eq!(past_max.next_level, 10);
        assert!(past_max.is_retired);
    }

    #[test]
    fn apply_outcome_sets_learned_date_once() {
        let mut card = Flashcard::new("d1", "arbre", "tree");
        let first = Utc::now();
        card.apply_outcome(&promote_lesson(TimingVariant::Demo), first);
        assert_eq!(card.level, 1);
        assert_eq!(card.learned_date, Some(first));
        assert_eq!(card.next_review_date, Some(first + Duration::seconds(30)));

        let later = first + Duration::minutes(2);
        card.apply_outcome(&compute_next_state(TimingVariant::Demo, 1, 0), later);
        assert_eq!(card.level, 2);
        assert_eq!(card.learned_date, Some(first));
    }

    #[test]
    fn retirement_clears_next_review_date() {
        let mut card = Flashcard::new("d1", "arbre", "tree");
        card.level = 3;
        card.next_review_date = Some(Utc::now());
        card.apply_outcome(&compute_next_state(TimingVariant::Demo, 3, 0), Utc::now());
        assert!(card.retired);
        assert_eq!(card.next_review_date, None);
    }

    #[test]
    fn outcome_serializes_timing_as_millis() {
        let outcome = promote_lesson(TimingVariant::Demo);
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["nextTiming"], 30_000);
        assert_eq!(json["nextLevel"], 1);
        let back: SrsOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
