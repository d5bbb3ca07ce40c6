use chrono::{DateTime, Utc};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;

use crate::constants::MAX_CARD_SIDE_CHARS;
use crate::srs::Flashcard;
use crate::store::keys;
use crate::store::{Store, StoreError};

fn due_index_key_for_card(card: &Flashcard) -> Result<Option<String>, StoreError> {
    match (card.next_review_date, card.retired) {
        (Some(next_review_date), false) => Ok(Some(keys::card_due_index_key(
            &card.deck_id,
            next_review_date.timestamp_millis(),
            &card.id,
        )?)),
        _ => Ok(None),
    }
}

pub(crate) fn check_card(card: &Flashcard) -> Result<(), StoreError> {
    for (side, text) in [("front", &card.front), ("back", &card.back)] {
        let len = text.trim().chars().count();
        if len == 0 || len > MAX_CARD_SIDE_CHARS {
            return Err(StoreError::Validation(format!(
                "card {side} must be 1-{MAX_CARD_SIDE_CHARS} characters"
            )));
        }
    }
    Ok(())
}

fn creation_order(cards: &mut [Flashcard]) {
    cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

impl Store {
    /// Adds a card to an existing deck.
    pub fn insert_card(&self, card: &Flashcard) -> Result<(), StoreError> {
        check_card(card)?;
        if self.get_deck(&card.deck_id)?.is_none() {
            return Err(StoreError::not_found("deck", &card.deck_id));
        }
        let key = keys::card_key(&card.deck_id, &card.id)?;
        if self.cards.contains_key(key.as_bytes())? {
            return Err(StoreError::Conflict {
                entity: "card".to_string(),
                key,
            });
        }
        self.set_card(card)
    }

    pub fn get_card(&self, deck_id: &str, card_id: &str) -> Result<Option<Flashcard>, StoreError> {
        let key = keys::card_key(deck_id, card_id)?;
        match self.cards.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Writes the card and moves its due index entry in one transaction.
    pub fn set_card(&self, card: &Flashcard) -> Result<(), StoreError> {
        let key = keys::card_key(&card.deck_id, &card.id)?;
        let value = Self::serialize(card)?;
        let next_due_index_key = due_index_key_for_card(card)?;

        (&self.cards, &self.card_due_index)
            .transaction(|(tx_cards, tx_due_index)| {
                if let Some(old_raw) = tx_cards.get(key.as_bytes())? {
                    let old_card: Flashcard = serde_json::from_slice(&old_raw).map_err(|error| {
                        ConflictableTransactionError::Abort(StoreError::Serialization(error))
                    })?;
                    if let Some(old_due_index_key) = due_index_key_for_card(&old_card)
                        .map_err(ConflictableTransactionError::Abort)?
                    {
                        tx_due_index.remove(old_due_index_key.as_bytes())?;
                    }
                }

                tx_cards.insert(key.as_bytes(), value.as_slice())?;

                if let Some(due_index_key) = &next_due_index_key {
                    tx_due_index.insert(due_index_key.as_bytes(), &[])?;
                }

                Ok(())
            })
            .map_err(|error: TransactionError<StoreError>| match error {
                TransactionError::Abort(store_error) => store_error,
                TransactionError::Storage(storage_error) => StoreError::Sled(storage_error),
            })?;

        tracing::debug!(
            card_id = %card.id,
            level = card.level,
            retired = card.retired,
            next_review_date = ?card.next_review_date,
            "Card saved"
        );
        Ok(())
    }

    pub fn delete_card(&self, deck_id: &str, card_id: &str) -> Result<bool, StoreError> {
        let Some(card) = self.get_card(deck_id, card_id)? else {
            return Ok(false);
        };
        if let Some(index_key) = due_index_key_for_card(&card)? {
            self.card_due_index.remove(index_key.as_bytes())?;
        }
        self.cards
            .remove(keys::card_key(deck_id, card_id)?.as_bytes())?;
        Ok(true)
    }

    /// All cards of a deck in creation order.
    pub fn list_deck_cards(&self, deck_id: &str) -> Result<Vec<Flashcard>, StoreError> {
        let prefix = keys::card_prefix(deck_id)?;
        let mut cards = Vec::new();
        for item in self.cards.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            cards.push(Self::deserialize::<Flashcard>(&value)?);
        }
        creation_order(&mut cards);
        Ok(cards)
    }

    /// Cards whose review date has passed, earliest first.
    pub fn get_due_cards(
        &self,
        deck_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Flashcard>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let prefix = keys::card_due_index_prefix(deck_id)?;
        let upper = keys::card_due_index_upper_bound(deck_id, now.timestamp_millis())?;
        let mut cards = Vec::new();

        for item in self
            .card_due_index
            .range(prefix.as_bytes()..=upper.as_bytes())
        {
            let (index_key, _) = item?;
            let index_key = String::from_utf8_lossy(&index_key);
            let Some(card_id) = index_key.rsplit(':').next() else {
                continue;
            };

            match self.get_card(deck_id, card_id)? {
                Some(card) if card.is_due(now) => cards.push(card),
                Some(_) => {}
                None => {
                    tracing::warn!(deck_id, card_id, "Due index points at a missing card");
                }
            }

            if cards.len() >= limit {
                break;
            }
        }

        Ok(cards)
    }

    /// Cards not learned yet, in creation order.
    pub fn get_lesson_cards(
        &self,
        deck_id: &str,
        limit: usize,
    ) -> Result<Vec<Flashcard>, StoreError> {
        let mut lessons: Vec<Flashcard> = self
            .list_deck_cards(deck_id)?
            .into_iter()
            .filter(Flashcard::is_lesson)
            .collect();
        lessons.truncate(limit);
        Ok(lessons)
    }

    pub fn count_learned_since(
        &self,
        deck_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let count = self
            .list_deck_cards(deck_id)?
            .iter()
            .filter(|card| card.learned_date.is_some_and(|learned| learned >= since))
            .count();
        Ok(count as u32)
    }
}
