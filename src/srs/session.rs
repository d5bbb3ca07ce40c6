use serde::{Deserialize, Serialize};

use super::SessionError;

/// Phase of a single card presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum SessionPhase {
    #[default]
    Interrogation,
    Answered {
        was_correct: bool,
    },
    /// The last outstanding card of the batch was answered correctly.
    Finished {
        was_correct: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    StartNext,
    Answer { was_correct: bool },
    Finish { was_correct: bool },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Interrogation => "interrogation",
            SessionPhase::Answered { .. } => "answered",
            SessionPhase::Finished { .. } => "finished",
        }
    }

    pub fn is_answered(&self) -> bool {
        !matches!(self, SessionPhase::Interrogation)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SessionPhase::Finished { .. })
    }

    pub fn was_correct(&self) -> Option<bool> {
        match self {
            SessionPhase::Interrogation => None,
            SessionPhase::Answered { was_correct } | SessionPhase::Finished { was_correct } => {
                Some(*was_correct)
            }
        }
    }
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StartNext => "START_NEXT",
            SessionEvent::Answer { .. } => "ANSWER",
            SessionEvent::Finish { .. } => "FINISH",
        }
    }
}

pub fn reduce(phase: SessionPhase, event: SessionEvent) -> Result<SessionPhase, SessionError> {
    match (phase, event) {
        (SessionPhase::Answered { .. }, SessionEvent::StartNext) => Ok(SessionPhase::Interrogation),
        (SessionPhase::Interrogation, SessionEvent::Answer { was_correct }) => {
            Ok(SessionPhase::Answered { was_correct })
        }
        (SessionPhase::Interrogation, SessionEvent::Finish { was_correct: true }) => {
            Ok(SessionPhase::Finished { was_correct: true })
        }
        (from, event) => Err(SessionError::InvalidTransition {
            from: from.name(),
            event: event.name(),
        }),
    }
}

/// Exact match after trimming and lowercasing both sides.
pub fn is_correct_answer(expected: &str, submitted: &str) -> bool {
    expected.trim().to_lowercase() == submitted.trim().to_lowercase()
}
