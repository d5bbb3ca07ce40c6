use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::config::DeckDefaults;
use crate::srs::{Deck, Flashcard, TimingVariant};
use crate::store::operations::cards::check_card;
use crate::store::{Store, StoreError};

/// Deck file accepted by the `import` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckImport {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub srs_timings_type: Option<TimingVariant>,
    #[serde(default)]
    pub lessons_per_day: Option<u32>,
    #[serde(default)]
    pub lessons_batch_size: Option<u32>,
    #[serde(default)]
    pub cards: Vec<CardImport>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardImport {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DeckImport {
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Creates the deck and its cards. Cards keep the file's order as their
/// lesson order. Every card is checked before anything is written; a store
/// failure while inserting cards removes the partial deck again.
pub fn import_deck(
    store: &Store,
    import: &DeckImport,
    defaults: &DeckDefaults,
) -> Result<Deck, StoreError> {
    let mut deck = Deck::new(
        &import.name,
        import
            .srs_timings_type
            .unwrap_or(defaults.srs_timings_type),
    );
    deck.description = import.description.clone();
    deck.lessons_per_day = import.lessons_per_day.unwrap_or(defaults.lessons_per_day);
    deck.lessons_batch_size = import
        .lessons_batch_size
        .unwrap_or(defaults.lessons_batch_size);

    let base = Utc::now();
    let cards = import
        .cards
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            let mut card = Flashcard::new(&deck.id, entry.front.trim(), entry.back.trim());
            card.notes = entry.notes.clone();
            card.created_at = base + Duration::microseconds(position as i64);
            check_card(&card).map_err(|e| match e {
                StoreError::Validation(message) => {
                    StoreError::Validation(format!("card {}: {message}", position + 1))
                }
                other => other,
            })?;
            Ok(card)
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    store.create_deck(&deck)?;
    for card in &cards {
        if let Err(e) = store.insert_card(card) {
            tracing::warn!(deck_id = %deck.id, error = %e, "Import failed, removing partial deck");
            store.delete_deck(&deck.id)?;
            return Err(e);
        }
    }

    tracing::info!(
        deck_id = %deck.id,
        cards = cards.len(),
        timings = %deck.srs_timings_type,
        "Deck imported"
    );
    Ok(deck)
}
