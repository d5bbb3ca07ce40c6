pub const DECKS: &str = "decks";
pub const CARDS: &str = "cards";
pub const CARD_DUE_INDEX: &str = "card_due_index";
pub const META: &str = "meta";
