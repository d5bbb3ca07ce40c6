/// Default lessons per day for a new deck
pub const DEFAULT_LESSONS_PER_DAY: u32 = 15;

/// Default lesson batch size for a new deck
pub const DEFAULT_LESSONS_BATCH_SIZE: u32 = 5;

/// Upper bound for lessons per day
pub const MAX_LESSONS_PER_DAY: u32 = 100;

/// Allowed lesson batch sizes
pub const MIN_LESSONS_BATCH_SIZE: u32 = 3;
pub const MAX_LESSONS_BATCH_SIZE: u32 = 10;

/// Max characters on either side of a card
pub const MAX_CARD_SIDE_CHARS: usize = 55;

/// Max characters in a deck name
pub const MAX_DECK_NAME_CHARS: usize = 60;

/// Default cap on cards pulled into one review pass
pub const DEFAULT_REVIEW_LIMIT: usize = 100;

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;
