use crate::srs::Flashcard;
use crate::store::keys;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_card_due_index", m002_card_due_index),
    ]
}

/// Applies pending migrations in order.
///
/// Each migration must be idempotent: a crash between running it and
/// persisting the version reruns it on the next start. Versions only move
/// forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;

    for (index, (name, func)) in migrations().iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("corrupt version marker ({} bytes)", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

fn m002_card_due_index(store: &Store) -> Result<(), StoreError> {
    let mut indexed = 0u64;
    for item in store.cards.iter() {
        let (_, value) = item?;
        let card: Flashcard = Store::deserialize(&value)?;

        if let (Some(next_review_date), false) = (card.next_review_date, card.retired) {
            let due_index_key = keys::card_due_index_key(
                &card.deck_id,
                next_review_date.timestamp_millis(),
                &card.id,
            )?;
            store.card_due_index.insert(due_index_key.as_bytes(), &[])?;
            indexed += 1;
        }
    }
    tracing::debug!(indexed, "Rebuilt card due index");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_is_idempotent() {
        let store = Store::temporary().unwrap();

        run(&store).unwrap();
        let first = get_current_version(&store).unwrap();
        run(&store).unwrap();
        let second = get_current_version(&store).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn downgrade_is_rejected() {
        let store = Store::temporary().unwrap();

        set_version(&store, 3).unwrap();
        let err = set_version(&store, 2).unwrap_err();
        assert!(matches!(err, StoreError::Migration { .. }));
    }

    #[test]
    fn due_index_rebuild_skips_undated_and_retired_cards() {
        let store = Store::temporary().unwrap();
        let now = chrono::Utc::now();

        let mut due = Flashcard::new("d1", "a", "1");
        due.level = 1;
        due.next_review_date = Some(now);
        let lesson = Flashcard::new("d1", "b", "2");
        let mut retired = Flashcard::new("d1", "c", "3");
        retired.level = 9;
        retired.retired = true;
        retired.next_review_date = Some(now);

        for card in [&due, &lesson, &retired] {
            let key = keys::card_key(&card.deck_id, &card.id).unwrap();
            store
                .cards
                .insert(key.as_bytes(), Store::serialize(card).unwrap())
                .unwrap();
        }

        run(&store).unwrap();
        assert_eq!(store.card_due_index.len(), 1);
    }
}
