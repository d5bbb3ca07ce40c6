use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::constants::DEFAULT_REVIEW_LIMIT;
use crate::srs::queue::sort_due_first;
use crate::srs::{
    max_level, Deck, Flashcard, LessonFlow, ResolvedCard, ReviewPass, SessionError, TimingVariant,
};
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("deck not found: {0}")]
    DeckNotFound(String),
    #[error("no {kind} for deck {deck} right now")]
    NothingToStudy { deck: String, kind: &'static str },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSummary {
    pub deck_id: String,
    pub name: String,
    pub pathname: String,
    pub srs_timings_type: TimingVariant,
    pub total_cards: usize,
    pub lessons_available: usize,
    pub lessons_remaining_today: u32,
    pub due_reviews: usize,
    pub retired: usize,
    pub max_level: u32,
    pub next_review_date: Option<DateTime<Utc>>,
}

/// Host-side glue: pulls card sets out of the store for the scheduling
/// core and writes its outcomes back.
#[derive(Clone)]
pub struct StudyService {
    store: Arc<Store>,
}

impl StudyService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Resolves a deck by id or pathname.
    pub fn deck(&self, deck_ref: &str) -> Result<Deck, StudyError> {
        self.store
            .find_deck(deck_ref)?
            .ok_or_else(|| StudyError::DeckNotFound(deck_ref.to_string()))
    }

    /// Daily lesson allowance left, counted from the start of the UTC day.
    pub fn lessons_remaining_today(
        &self,
        deck: &Deck,
        now: DateTime<Utc>,
    ) -> Result<u32, StudyError> {
        let start_of_day = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let learned_today = self.store.count_learned_since(&deck.id, start_of_day)?;
        Ok(deck.lessons_per_day.saturating_sub(learned_today))
    }

    pub fn start_lessons(&self, deck_ref: &str, now: DateTime<Utc>) -> Result<LessonFlow, StudyError> {
        let deck = self.deck(deck_ref)?;
        let allowance = self.lessons_remaining_today(&deck, now)?;
        let lessons = self.store.get_lesson_cards(&deck.id, allowance as usize)?;
        if lessons.is_empty() {
            return Err(StudyError::NothingToStudy {
                deck: deck.name,
                kind: "lessons",
            });
        }

        tracing::info!(
            deck_id = %deck.id,
            lessons = lessons.len(),
            batch_size = deck.lessons_batch_size,
            "Starting lessons"
        );
        Ok(LessonFlow::new(
            deck.srs_timings_type,
            lessons,
            deck.lessons_batch_size as usize,
        )?)
    }

    pub fn start_reviews(&self, deck_ref: &str, now: DateTime<Utc>) -> Result<ReviewPass, StudyError> {
        let deck = self.deck(deck_ref)?;
        let mut due = self
            .store
            .get_due_cards(&deck.id, now, DEFAULT_REVIEW_LIMIT)?;
        if due.is_empty() {
            return Err(StudyError::NothingToStudy {
                deck: deck.name,
                kind: "reviews",
            });
        }
        sort_due_first(&mut due);

        tracing::info!(deck_id = %deck.id, reviews = due.len(), "Starting reviews");
        Ok(ReviewPass::review(deck.srs_timings_type, due)?)
    }

    /// Persists one card's outcome onto the stored record.
    pub fn record_resolved(
        &self,
        resolved: &ResolvedCard,
        now: DateTime<Utc>,
    ) -> Result<Flashcard, StudyError> {
        let deck_id = &resolved.card.deck_id;
        let card_id = &resolved.card.id;
        let mut card = self
            .store
            .get_card(deck_id, card_id)?
            .ok_or_else(|| StoreError::not_found("card", card_id))?;

        let previous_level = card.level;
        card.apply_outcome(&resolved.outcome, now);
        self.store.set_card(&card)?;

        tracing::info!(
            card_id = %card.id,
            previous_level,
            level = card.level,
            incorrect = resolved.incorrect_count,
            retired = card.retired,
            "Card rescheduled"
        );
        Ok(card)
    }

    /// Persists a finished lesson batch.
    pub fn record_batch(
        &self,
        resolved: &[ResolvedCard],
        now: DateTime<Utc>,
    ) -> Result<Vec<Flashcard>, StudyError> {
        resolved
            .iter()
            .map(|entry| self.record_resolved(entry, now))
            .collect()
    }

    /// Deletes one card of a deck. Returns false when the deck has no such card.
    pub fn delete_card(&self, deck_ref: &str, card_id: &str) -> Result<bool, StudyError> {
        let deck = self.deck(deck_ref)?;
        let removed = self.store.delete_card(&deck.id, card_id)?;
        if removed {
            tracing::info!(deck_id = %deck.id, card_id, "Card deleted");
        }
        Ok(removed)
    }

    pub fn deck_summary(&self, deck_ref: &str, now: DateTime<Utc>) -> Result<DeckSummary, StudyError> {
        let deck = self.deck(deck_ref)?;
        let cards = self.store.list_deck_cards(&deck.id)?;

        let lessons_available = cards.iter().filter(|c| c.is_lesson()).count();
        let due_reviews = cards.iter().filter(|c| c.is_due(now)).count();
        let retired = cards.iter().filter(|c| c.retired).count();
        let next_review_date = cards
            .iter()
            .filter(|c| !c.retired)
            .filter_map(|c| c.next_review_date)
            .min();

        Ok(DeckSummary {
            lessons_remaining_today: self.lessons_remaining_today(&deck, now)?,
            max_level: max_level(deck.srs_timings_type),
            deck_id: deck.id,
            name: deck.name,
            pathname: deck.pathname,
            srs_timings_type: deck.srs_timings_type,
            total_cards: cards.len(),
            lessons_available,
            due_reviews,
            retired,
            next_review_date,
        })
    }
}
