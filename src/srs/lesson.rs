//! Lesson flow: each batch of new cards is first shown front/back
//! (learn), then quizzed with a [`ReviewPass`] whose completion promotes
//! every card of the batch to level 1.

use serde::{Deserialize, Serialize};

use super::queue::{ResolvedCard, ReviewPass};
use super::types::{Flashcard, TimingVariant};
use super::SessionError;

pub fn partition_batches(
    cards: Vec<Flashcard>,
    batch_size: usize,
) -> Result<Vec<Vec<Flashcard>>, SessionError> {
    if batch_size == 0 {
        return Err(SessionError::InvalidBatchSize(batch_size));
    }

    let mut batches: Vec<Vec<Flashcard>> = Vec::with_capacity(cards.len().div_ceil(batch_size));
    for card in cards {
        match batches.last_mut() {
            Some(batch) if batch.len() < batch_size => batch.push(card),
            _ => batches.push(vec![card]),
        }
    }
    Ok(batches)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStep {
    Advanced,
    /// `next` was called on the last card.
    Completed,
}

/// Linear walk over one batch; no answers, no scheduling.
#[derive(Debug, Clone)]
pub struct LessonSession {
    cards: Vec<Flashcard>,
    index: usize,
    flipped: bool,
}

// `new` rejects empty batches, so there is no `is_empty`.
#[allow(clippy::len_without_is_empty)]
impl LessonSession {
    pub fn new(cards: Vec<Flashcard>) -> Result<Self, SessionError> {
        if cards.is_empty() {
            return Err(SessionError::EmptyBatch);
        }
        Ok(Self {
            cards,
            index: 0,
            flipped: false,
        })
    }

    pub fn current(&self) -> &Flashcard {
        &self.cards[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.cards.len()
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    pub fn next(&mut self) -> LessonStep {
        if self.is_last() {
            return LessonStep::Completed;
        }
        self.index += 1;
        self.flipped = false;
        LessonStep::Advanced
    }

    /// Returns false when already on the first card.
    pub fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.flipped = false;
        true
    }

    pub fn progress(&self) -> f64 {
        (self.index + 1) as f64 / self.cards.len() as f64
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LessonMode {
    Learn,
    Quiz,
    BatchFinished,
}

impl LessonMode {
    fn name(self) -> &'static str {
        match self {
            LessonMode::Learn => "learn",
            LessonMode::Quiz => "quiz",
            LessonMode::BatchFinished => "batch_finished",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LessonFlow {
    variant: TimingVariant,
    batches: Vec<Vec<Flashcard>>,
    batch_index: usize,
    mode: LessonMode,
    learn: LessonSession,
    quiz: Option<ReviewPass>,
}

impl LessonFlow {
    pub fn new(
        variant: TimingVariant,
        cards: Vec<Flashcard>,
        batch_size: usize,
    ) -> Result<Self, SessionError> {
        let batches = partition_batches(cards, batch_size)?;
        let first = batches.first().cloned().ok_or(SessionError::EmptyBatch)?;

        Ok(Self {
            variant,
            batches,
            batch_index: 0,
            mode: LessonMode::Learn,
            learn: LessonSession::new(first)?,
            quiz: None,
        })
    }

    pub fn mode(&self) -> LessonMode {
        self.mode
    }

    pub fn variant(&self) -> TimingVariant {
        self.variant
    }

    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn has_next_batch(&self) -> bool {
        self.batch_index + 1 < self.batches.len()
    }

    pub fn learn(&mut self) -> Result<&mut LessonSession, SessionError> {
        self.expect_mode(LessonMode::Learn)?;
        Ok(&mut self.learn)
    }

    pub fn quiz(&mut self) -> Result<&mut ReviewPass, SessionError> {
        self.expect_mode(LessonMode::Quiz)?;
        self.quiz.as_mut().ok_or(SessionError::WrongMode {
            expected: LessonMode::Quiz.name(),
            actual: self.mode.name(),
        })
    }

    /// Ends the learn phase; the same cards are quizzed in the same order.
    pub fn start_quiz(&mut self) -> Result<&mut ReviewPass, SessionError> {
        self.expect_mode(LessonMode::Learn)?;
        let pass = ReviewPass::lesson_quiz(self.variant, self.learn.cards().to_vec())?;
        self.mode = LessonMode::Quiz;
        Ok(self.quiz.insert(pass))
    }

    /// Returns the level-1 promotions for the batch once its quiz is finished.
    pub fn complete_quiz(&mut self) -> Result<Vec<ResolvedCard>, SessionError> {
        self.expect_mode(LessonMode::Quiz)?;
        let pass = self.quiz.take().ok_or(SessionError::WrongMode {
            expected: LessonMode::Quiz.name(),
            actual: self.mode.name(),
        })?;
        if !pass.is_finished() {
            let remaining = pass.remaining();
            self.quiz = Some(pass);
            return Err(SessionError::PassIncomplete { remaining });
        }
        let promotions = pass.finish()?;
        self.mode = LessonMode::BatchFinished;
        Ok(promotions)
    }

    pub fn next_batch(&mut self) -> Result<&mut LessonSession, SessionError> {
        self.expect_mode(LessonMode::BatchFinished)?;
        if !self.has_next_batch() {
            return Err(SessionError::NoMoreBatches);
        }
        self.batch_index += 1;
        self.learn = LessonSession::new(self.batches[self.batch_index].clone())?;
        self.mode = LessonMode::Learn;
        Ok(&mut self.learn)
    }

    fn expect_mode(&self, expected: LessonMode) -> Result<(), SessionError> {
        if self.mode != expected {
            return Err(SessionError::WrongMode {
                expected: expected.name(),
                actual: self.mode.name(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: usize) -> Vec<Flashcard> {
        (0..n)
            .map(|i| Flashcard::new("deck", &format!("front-{i}"), &format!("back-{i}")))
            .collect()
    }

    #[test]
    fn batches_keep_order_and_size() {
        let batches = partition_batches(cards(7), 3).unwrap();
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, [3, 3, 1]);
        assert_eq!(batches[1][0].front, "front-3");
        assert_eq!(batches[2][0].front, "front-6");
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert_eq!(
            partition_batches(cards(2), 0).unwrap_err(),
            SessionError::InvalidBatchSize(0)
        );
    }

    #[test]
    fn empty_lesson_is_rejected() {
        assert_eq!(
            LessonSession::new(Vec::new()).unwrap_err(),
            SessionError::EmptyBatch
        );
        assert_eq!(
            LessonFlow::new(TimingVariant::Default, Vec::new(), 3).unwrap_err(),
            SessionError::EmptyBatch
        );
    }

    #[test]
    fn lesson_session_walks_forward_and_back() {
        let mut session = LessonSession::new(cards(3)).unwrap();
        assert!(!session.previous());
        session.flip();
        assert!(session.is_flipped());

        assert_eq!(session.next(), LessonStep::Advanced);
        assert!(!session.is_flipped());
        assert_eq!(session.next(), LessonStep::Advanced);
        assert!(session.is_last());
        assert_eq!(session.progress(), 1.0);
        assert_eq!(session.next(), LessonStep::Completed);
        assert_eq!(session.index(), 2);

        assert!(session.previous());
        assert_eq!(session.current().front, "front-1");
    }

    #[test]
    fn quiz_requires_learn_phase_first() {
        let mut flow = LessonFlow::new(TimingVariant::Default, cards(2), 5).unwrap();
        assert!(matches!(
            flow.quiz().unwrap_err(),
            SessionError::WrongMode { expected: "quiz", .. }
        ));
        assert!(flow.complete_quiz().is_err());
        flow.start_quiz().unwrap();
        assert!(flow.learn().is_err());
    }

    #[test]
    fn incomplete_quiz_stays_open() {
        let mut flow = LessonFlow::new(TimingVariant::Default, cards(2), 5).unwrap();
        flow.start_quiz().unwrap().submit("back-0").unwrap();
        assert_eq!(
            flow.complete_quiz().unwrap_err(),
            SessionError::PassIncomplete { remaining: 1 }
        );
        assert_eq!(flow.mode(), LessonMode::Quiz);
        assert_eq!(flow.quiz().unwrap().remaining(), 1);
    }

    #[test]
    fn last_batch_has_no_successor() {
        let mut flow = LessonFlow::new(TimingVariant::Demo, cards(1), 5).unwrap();
        assert!(!flow.has_next_batch());
        flow.start_quiz().unwrap().submit("back-0").unwrap();
        flow.complete_quiz().unwrap();
        assert_eq!(flow.next_batch().unwrap_err(), SessionError::NoMoreBatches);
    }
}
