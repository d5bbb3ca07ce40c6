//! Spaced-repetition core: timing tables, the leveling engine, the
//! per-card session reducer and the batch queue. Pure and synchronous;
//! persistence is the caller's business.

pub mod engine;
pub mod lesson;
pub mod queue;
pub mod session;
pub mod timing;
pub mod types;

use thiserror::Error;

pub use engine::{compute_next_state, promote_lesson, SrsOutcome};
pub use lesson::{LessonFlow, LessonMode, LessonSession, LessonStep};
pub use queue::{AnswerFeedback, CardQueue, PassKind, ResolvedCard, ReviewPass};
pub use session::{SessionEvent, SessionPhase};
pub use timing::{max_level, timing_for};
pub use types::{Deck, Flashcard, TimingVariant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot study an empty batch")]
    EmptyBatch,
    #[error("batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),
    #[error("invalid transition: {event} while {from}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
    #[error("pass not finished: {remaining} card(s) still queued")]
    PassIncomplete { remaining: usize },
    #[error("lesson flow is in {actual} mode, expected {expected}")]
    WrongMode {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("no lesson batches left")]
    NoMoreBatches,
}
