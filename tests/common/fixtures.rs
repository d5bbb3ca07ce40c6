use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use flashcard_srs::srs::{Deck, Flashcard, TimingVariant};
use flashcard_srs::store::Store;

pub struct TestStore {
    pub store: Arc<Store>,
    _temp_dir: TempDir,
}

/// On-disk store in a temp dir, migrated like the binary does at startup.
pub fn open_store() -> TestStore {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("flashcards-test.sled");
    let store = Store::open(sled_path.to_str().expect("utf-8 path")).expect("open sled");
    store.run_migrations().expect("run migrations");
    TestStore {
        store: Arc::new(store),
        _temp_dir: temp_dir,
    }
}

pub fn card(front: &str, back: &str) -> Flashcard {
    Flashcard::new("deck", front, back)
}

pub fn card_at_level(front: &str, back: &str, level: u32) -> Flashcard {
    let mut c = card(front, back);
    c.level = level;
    c.next_review_date = Some(Utc::now() - Duration::minutes(1));
    c
}

pub fn seed_deck(store: &Store, name: &str, variant: TimingVariant, cards: &[(&str, &str)]) -> Deck {
    let mut deck = Deck::new(name, variant);
    deck.lessons_per_day = 10;
    deck.lessons_batch_size = 3;
    store.create_deck(&deck).expect("create seed deck");

    let base = Utc::now() - Duration::hours(1);
    for (idx, (front, back)) in cards.iter().enumerate() {
        let mut c = Flashcard::new(&deck.id, front, back);
        c.created_at = base + Duration::seconds(idx as i64);
        store.insert_card(&c).expect("insert seed card");
    }
    deck
}
