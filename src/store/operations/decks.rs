use crate::constants::{
    MAX_DECK_NAME_CHARS, MAX_LESSONS_BATCH_SIZE, MAX_LESSONS_PER_DAY, MIN_LESSONS_BATCH_SIZE,
};
use sled::transaction::{ConflictableTransactionError, TransactionError};

use crate::srs::{Deck, TimingVariant};
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckSettings {
    pub lessons_per_day: u32,
    pub lessons_batch_size: u32,
    pub srs_timings_type: TimingVariant,
}

/// Same bounds the deck table enforces with check constraints.
fn check_deck(deck: &Deck) -> Result<(), StoreError> {
    let name_len = deck.name.trim().chars().count();
    if name_len == 0 || name_len > MAX_DECK_NAME_CHARS {
        return Err(StoreError::Validation(format!(
            "deck name must be 1-{MAX_DECK_NAME_CHARS} characters"
        )));
    }
    if deck.pathname.is_empty() {
        return Err(StoreError::Validation(
            "deck pathname must not be empty".to_string(),
        ));
    }
    if deck.lessons_per_day == 0 || deck.lessons_per_day > MAX_LESSONS_PER_DAY {
        return Err(StoreError::Validation(format!(
            "lessons_per_day must be 1-{MAX_LESSONS_PER_DAY}, got {}",
            deck.lessons_per_day
        )));
    }
    if !(MIN_LESSONS_BATCH_SIZE..=MAX_LESSONS_BATCH_SIZE).contains(&deck.lessons_batch_size) {
        return Err(StoreError::Validation(format!(
            "lessons_batch_size must be {MIN_LESSONS_BATCH_SIZE}-{MAX_LESSONS_BATCH_SIZE}, got {}",
            deck.lessons_batch_size
        )));
    }
    if deck.lessons_per_day < deck.lessons_batch_size {
        return Err(StoreError::Validation(
            "lessons_per_day should be at least as big as lessons_batch_size".to_string(),
        ));
    }
    Ok(())
}

impl Store {
    /// Claims the pathname and writes the deck in one transaction.
    pub fn create_deck(&self, deck: &Deck) -> Result<(), StoreError> {
        check_deck(deck)?;
        let key = keys::deck_key(&deck.id)?;
        let pathname_key = keys::deck_pathname_index_key(&deck.pathname);
        let value = Self::serialize(deck)?;

        self.decks
            .transaction(|tx_decks| {
                if tx_decks.get(pathname_key.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StoreError::Conflict {
                        entity: "deck".to_string(),
                        key: deck.pathname.clone(),
                    }));
                }
                tx_decks.insert(pathname_key.as_bytes(), deck.id.as_bytes())?;
                tx_decks.insert(key.as_bytes(), value.as_slice())?;
                Ok(())
            })
            .map_err(|error: TransactionError<StoreError>| match error {
                TransactionError::Abort(store_error) => store_error,
                TransactionError::Storage(storage_error) => StoreError::Sled(storage_error),
            })?;

        tracing::info!(deck_id = %deck.id, pathname = %deck.pathname, "Deck created");
        Ok(())
    }

    pub fn get_deck(&self, deck_id: &str) -> Result<Option<Deck>, StoreError> {
        let key = keys::deck_key(deck_id)?;
        match self.decks.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_deck_by_pathname(&self, pathname: &str) -> Result<Option<Deck>, StoreError> {
        let index_key = keys::deck_pathname_index_key(pathname);
        match self.decks.get(index_key.as_bytes())? {
            Some(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(deck_id) => self.get_deck(&deck_id),
                Err(e) => {
                    tracing::warn!(error = %e, pathname, "Invalid UTF-8 in deck pathname index");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Looks a deck up by id first, then by pathname.
    pub fn find_deck(&self, id_or_pathname: &str) -> Result<Option<Deck>, StoreError> {
        if keys::deck_key(id_or_pathname).is_ok() {
            if let Some(deck) = self.get_deck(id_or_pathname)? {
                return Ok(Some(deck));
            }
        }
        self.get_deck_by_pathname(id_or_pathname)
    }

    pub fn list_decks(&self) -> Result<Vec<Deck>, StoreError> {
        let mut decks = Vec::new();
        for item in self.decks.iter() {
            let (key, value) = item?;
            if key.starts_with(b"pathname:") {
                continue;
            }
            decks.push(Self::deserialize::<Deck>(&value)?);
        }
        decks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(decks)
    }

    pub fn update_deck_settings(
        &self,
        deck_id: &str,
        settings: DeckSettings,
    ) -> Result<Deck, StoreError> {
        let mut deck = self
            .get_deck(deck_id)?
            .ok_or_else(|| StoreError::not_found("deck", deck_id))?;
        deck.lessons_per_day = settings.lessons_per_day;
        deck.lessons_batch_size = settings.lessons_batch_size;
        deck.srs_timings_type = settings.srs_timings_type;
        check_deck(&deck)?;

        let key = keys::deck_key(deck_id)?;
        self.decks.insert(key.as_bytes(), Self::serialize(&deck)?)?;
        Ok(deck)
    }

    /// Removes the deck and every card it owns.
    pub fn delete_deck(&self, deck_id: &str) -> Result<bool, StoreError> {
        let key = keys::deck_key(deck_id)?;
        let Some(deck) = self.get_deck(deck_id)? else {
            return Ok(false);
        };

        let card_prefix = keys::card_prefix(deck_id)?;
        let card_keys = self
            .cards
            .scan_prefix(card_prefix.as_bytes())
            .keys()
            .collect::<Result<Vec<_>, _>>()?;
        let due_prefix = keys::card_due_index_prefix(deck_id)?;
        let due_keys = self
            .card_due_index
            .scan_prefix(due_prefix.as_bytes())
            .keys()
            .collect::<Result<Vec<_>, _>>()?;

        let removed_cards = card_keys.len();
        for card_key in card_keys {
            self.cards.remove(card_key)?;
        }
        for index_key in due_keys {
            self.card_due_index.remove(index_key)?;
        }

        self.decks
            .remove(keys::deck_pathname_index_key(&deck.pathname).as_bytes())?;
        self.decks.remove(key.as_bytes())?;
        tracing::info!(deck_id, removed_cards, "Deck deleted");
        Ok(true)
    }
}
