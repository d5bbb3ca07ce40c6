//! Review delay tables, indexed by level (level 1 -> first entry).
//!
//! A level past the end of a table has no timing: a card that reaches it is
//! retired.

use chrono::Duration;

use crate::constants::{MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE, MILLIS_PER_SECOND};

use super::types::TimingVariant;

const MILLIS_PER_WEEK: i64 = 7 * MILLIS_PER_DAY;

// Stage intervals modeled on WaniKani's SRS stages.
const DEFAULT_TIMINGS_MS: [i64; 8] = [
    4 * MILLIS_PER_HOUR,
    8 * MILLIS_PER_HOUR,
    MILLIS_PER_DAY,
    2 * MILLIS_PER_DAY,
    MILLIS_PER_WEEK,
    2 * MILLIS_PER_WEEK,
    4 * MILLIS_PER_WEEK,
    16 * MILLIS_PER_WEEK,
];

const DEMO_TIMINGS_MS: [i64; 3] = [
    30 * MILLIS_PER_SECOND,
    MILLIS_PER_MINUTE,
    5 * MILLIS_PER_MINUTE,
];

pub fn timing_table(variant: TimingVariant) -> &'static [i64] {
    match variant {
        TimingVariant::Default => &DEFAULT_TIMINGS_MS,
        TimingVariant::Demo => &DEMO_TIMINGS_MS,
    }
}

/// Delay until a card at `level` is due again, or `None` once the level is
/// past the table. Level 0 has no timing either; the engine never asks.
pub fn timing_for(variant: TimingVariant, level: u32) -> Option<Duration> {
    let index = level.checked_sub(1)? as usize;
    timing_table(variant)
        .get(index)
        .map(|ms| Duration::milliseconds(*ms))
}

/// First level without a timing entry, i.e. the retirement level.
pub fn max_level(variant: TimingVariant) -> u32 {
    timing_table(variant).len() as u32 + 1
}
