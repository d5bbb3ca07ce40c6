//! FIFO pass over a batch of cards: a wrong answer sends the card to the
//! back of the queue, a right answer removes it for the rest of the pass.

use std::cmp::Ordering;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::engine::{compute_next_state, promote_lesson, SrsOutcome};
use super::session::{is_correct_answer, reduce, SessionEvent, SessionPhase};
use super::types::{Flashcard, TimingVariant};
use super::SessionError;

/// Due-first ordering. Undated cards sort after every dated card. Stable.
pub fn sort_due_first(cards: &mut [Flashcard]) {
    cards.sort_by(|a, b| match (a.next_review_date, b.next_review_date) {
        (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCard {
    pub card: Flashcard,
    pub incorrect_count: u32,
}

#[derive(Debug, Clone)]
pub struct CardQueue {
    pending: VecDeque<QueuedCard>,
    initial_len: usize,
}

impl CardQueue {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        let pending: VecDeque<QueuedCard> = cards
            .into_iter()
            .map(|card| QueuedCard {
                card,
                incorrect_count: 0,
            })
            .collect();
        let initial_len = pending.len();
        Self {
            pending,
            initial_len,
        }
    }

    pub fn current(&self) -> Option<&QueuedCard> {
        self.pending.front()
    }

    /// Counts a miss on the head card and moves it to the tail.
    /// Returns the card's miss count for this pass.
    pub fn requeue_current(&mut self) -> Option<u32> {
        let mut head = self.pending.pop_front()?;
        head.incorrect_count += 1;
        let count = head.incorrect_count;
        self.pending.push_back(head);
        Some(count)
    }

    pub fn resolve_current(&mut self) -> Option<QueuedCard> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn initial_len(&self) -> usize {
        self.initial_len
    }

    /// Share of the batch answered correctly so far, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.initial_len == 0 {
            return 1.0;
        }
        (self.initial_len - self.pending.len()) as f64 / self.initial_len as f64
    }

    pub fn card_ids(&self) -> Vec<&str> {
        self.pending.iter().map(|q| q.card.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PassKind {
    /// Quiz right after a lesson; finishing promotes every card to level 1.
    LessonQuiz,
    /// Due-card review; each card is rescheduled as soon as it is answered correctly.
    Review,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCard {
    pub card: Flashcard,
    pub incorrect_count: u32,
    pub outcome: SrsOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub was_correct: bool,
    pub expected: String,
    pub phase: SessionPhase,
    pub progress: f64,
    /// Set for review passes once the card is answered correctly.
    pub resolved: Option<ResolvedCard>,
}

/// One study pass over a batch, owned by the caller for its whole lifetime.
#[derive(Debug, Clone)]
pub struct ReviewPass {
    kind: PassKind,
    variant: TimingVariant,
    queue: CardQueue,
    phase: SessionPhase,
    presented: Flashcard,
    resolved: Vec<ResolvedCard>,
}

impl ReviewPass {
    pub fn review(variant: TimingVariant, cards: Vec<Flashcard>) -> Result<Self, SessionError> {
        Self::new(PassKind::Review, variant, cards)
    }

    pub fn lesson_quiz(
        variant: TimingVariant,
        cards: Vec<Flashcard>,
    ) -> Result<Self, SessionError> {
        Self::new(PassKind::LessonQuiz, variant, cards)
    }

    fn new(
        kind: PassKind,
        variant: TimingVariant,
        cards: Vec<Flashcard>,
    ) -> Result<Self, SessionError> {
        let queue = CardQueue::new(cards);
        let presented = queue
            .current()
            .map(|head| head.card.clone())
            .ok_or(SessionError::EmptyBatch)?;

        Ok(Self {
            kind,
            variant,
            resolved: Vec::with_capacity(queue.initial_len()),
            queue,
            phase: SessionPhase::Interrogation,
            presented,
        })
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn variant(&self) -> TimingVariant {
        self.variant
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }

    /// Card on screen: the one awaiting an answer, or the one just answered.
    pub fn current_card(&self) -> &Flashcard {
        &self.presented
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn total(&self) -> usize {
        self.queue.initial_len()
    }

    pub fn progress(&self) -> f64 {
        self.queue.progress()
    }

    pub fn queue(&self) -> &CardQueue {
        &self.queue
    }

    pub fn resolved(&self) -> &[ResolvedCard] {
        &self.resolved
    }

    pub fn submit(&mut self, answer: &str) -> Result<AnswerFeedback, SessionError> {
        if self.phase.is_answered() {
            return Err(SessionError::InvalidTransition {
                from: self.phase.name(),
                event: "ANSWER",
            });
        }

        let was_correct = is_correct_answer(&self.presented.back, answer);
        let is_last = self.queue.len() == 1;
        let event = if is_last && was_correct {
            SessionEvent::Finish { was_correct }
        } else {
            SessionEvent::Answer { was_correct }
        };
        self.phase = reduce(self.phase, event)?;

        let mut resolved = None;
        if was_correct {
            if let Some(done) = self.queue.resolve_current() {
                let outcome = match self.kind {
                    PassKind::Review => compute_next_state(
                        self.variant,
                        done.card.level,
                        done.incorrect_count,
                    ),
                    PassKind::LessonQuiz => promote_lesson(self.variant),
                };
                let entry = ResolvedCard {
                    card: done.card,
                    incorrect_count: done.incorrect_count,
                    outcome,
                };
                if self.kind == PassKind::Review {
                    resolved = Some(entry.clone());
                }
                self.resolved.push(entry);
            }
        } else {
            self.queue.requeue_current();
        }

        Ok(AnswerFeedback {
            was_correct,
            expected: self.presented.back.clone(),
            phase: self.phase,
            progress: self.queue.progress(),
            resolved,
        })
    }

    /// Acknowledges the feedback and presents the next card in rotation,
    /// which may be the card just missed.
    pub fn next(&mut self) -> Result<&Flashcard, SessionError> {
        self.phase = reduce(self.phase, SessionEvent::StartNext)?;
        if let Some(head) = self.queue.current() {
            self.presented = head.card.clone();
        }
        Ok(&self.presented)
    }

    /// Every card of the batch with its outcome, once all were answered correctly.
    pub fn finish(self) -> Result<Vec<ResolvedCard>, SessionError> {
        if !self.phase.is_finished() {
            return Err(SessionError::PassIncomplete {
                remaining: self.queue.len(),
            });
        }
        Ok(self.resolved)
    }
}
