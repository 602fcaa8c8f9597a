//! Practice session state machine.
//!
//! A session walks a fixed, already drawn list of words card by card. Each
//! card can be revealed and then tallied as learned or forgotten; the session
//! finishes after the last card. Side effects (status changes, review marks)
//! belong to the caller.

use crate::types::{StatusCode, WordRecord};

/// Result of a single card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeOutcome {
    Learned,
    Forgotten,
}

impl PracticeOutcome {
    /// Status the word should carry on the server after this outcome.
    pub fn status(self) -> StatusCode {
        match self {
            Self::Learned => StatusCode::Reviewed,
            Self::Forgotten => StatusCode::Forgotten,
        }
    }
}

/// State of one practice run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PracticeSession {
    words: Vec<WordRecord>,
    index: usize,
    revealed: bool,
    learned_count: u32,
    forgotten_count: u32,
    finished: bool,
}

impl PracticeSession {
    /// Start over the given words. An empty draw is finished immediately.
    pub fn new(words: Vec<WordRecord>) -> Self {
        let finished = words.is_empty();
        Self {
            words,
            finished,
            ..Default::default()
        }
    }

    pub fn words(&self) -> &[WordRecord] {
        &self.words
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn learned_count(&self) -> u32 {
        self.learned_count
    }

    pub fn forgotten_count(&self) -> u32 {
        self.forgotten_count
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Card on display, if any.
    pub fn current(&self) -> Option<&WordRecord> {
        if self.finished {
            return None;
        }
        self.words.get(self.index)
    }

    /// Flip the current card.
    pub fn reveal(&mut self) {
        if self.current().is_some() {
            self.revealed = !self.revealed;
        }
    }

    /// Count an outcome for the current card without moving on.
    ///
    /// Returns the card the outcome applies to, or `None` when there is no
    /// current card.
    pub fn tally(&mut self, outcome: PracticeOutcome) -> Option<WordRecord> {
        let word = self.current()?.clone();
        match outcome {
            PracticeOutcome::Learned => self.learned_count += 1,
            PracticeOutcome::Forgotten => self.forgotten_count += 1,
        }
        Some(word)
    }

    /// Move to the next card or finish. No-op once finished.
    pub fn advance(&mut self) {
        if self.finished {
            return;
        }
        if self.index + 1 < self.words.len() {
            self.index += 1;
            self.revealed = false;
        } else {
            self.finished = true;
        }
    }

    /// Value for a progress indicator: the 1-based card position while in
    /// progress and the session length once finished.
    pub fn progress_count(&self) -> usize {
        if self.finished || self.words.is_empty() {
            self.words.len()
        } else {
            self.index + 1
        }
    }
}
