// src/quiz/session.rs

use std::{collections::BTreeSet, fmt};

use rand::{Rng, seq::SliceRandom};
use serde::Serialize;

use crate::{
    models::exercise::Exercise,
    progress::grader::{correct_indices, grade},
};

/// One exercise as it enters a quiz, before shuffling.
#[derive(Debug, Clone)]
pub struct QuizItem {
    pub exercise_id: i64,
    pub name: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_options: Vec<bool>,
    pub hint: Option<String>,
}

impl From<Exercise> for QuizItem {
    fn from(exercise: Exercise) -> Self {
        Self {
            exercise_id: exercise.id,
            name: exercise.name,
            question: exercise.question,
            options: exercise.options.0,
            correct_options: exercise.correct_options.0,
            hint: exercise.hint,
        }
    }
}

/// A question as shown to the player: options in shuffled order.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub exercise_id: i64,
    pub name: String,
    pub question: String,
    pub options: Vec<String>,
    pub hint: Option<String>,
}

/// Shuffled options plus the correct flags remapped to the new positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledOptions {
    pub options: Vec<String>,
    pub correct_options: Vec<bool>,
}

/// Fisher–Yates shuffle of an option list that keeps the answer key aligned.
pub fn shuffle_options<R: Rng + ?Sized>(
    options: &[String],
    correct_options: &[bool],
    rng: &mut R,
) -> ShuffledOptions {
    let mut order: Vec<usize> = (0..options.len()).collect();
    order.shuffle(rng);

    ShuffledOptions {
        options: order.iter().map(|&i| options[i].clone()).collect(),
        correct_options: order
            .iter()
            .map(|&i| correct_options.get(i).copied().unwrap_or(false))
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Question `i` is next to be shown.
    Presenting(usize),
    /// Question `i` is on screen, waiting for a selection.
    AwaitingSelection(usize),
    /// Question `i` was answered.
    Submitted { index: usize, correct: bool },
    Finished,
}

/// Returned when an action does not fit the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub action: &'static str,
    pub state: SessionState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} while {:?}", self.action, self.state)
    }
}

impl std::error::Error for InvalidTransition {}

/// Result of grading the question on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub correct: bool,
    /// Correct positions in the shuffled order the player saw.
    pub correct_options: Vec<usize>,
}

/// Single-player quiz over a fixed list of exercises.
///
/// `Presenting(i) -> AwaitingSelection(i) -> Submitted(i) -> Presenting(i + 1)`,
/// ending in `Finished` after the last question. Options are reshuffled each
/// time a question is presented.
#[derive(Debug, Clone)]
pub struct QuizSession {
    user_id: i64,
    items: Vec<QuizItem>,
    state: SessionState,
    current: Option<ShuffledOptions>,
    score: usize,
}

impl QuizSession {
    pub fn new(user_id: i64, items: Vec<QuizItem>) -> Self {
        let state = if items.is_empty() {
            SessionState::Finished
        } else {
            SessionState::Presenting(0)
        };

        Self {
            user_id,
            items,
            state,
            current: None,
            score: 0,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    /// Shows the pending question with freshly shuffled options.
    pub fn present<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<QuestionView, InvalidTransition> {
        let SessionState::Presenting(index) = self.state else {
            return Err(self.invalid("present a question"));
        };

        let item = &self.items[index];
        let shuffled = shuffle_options(&item.options, &item.correct_options, rng);
        let view = QuestionView {
            index,
            exercise_id: item.exercise_id,
            name: item.name.clone(),
            question: item.question.clone(),
            options: shuffled.options.clone(),
            hint: item.hint.clone(),
        };

        self.current = Some(shuffled);
        self.state = SessionState::AwaitingSelection(index);
        Ok(view)
    }

    /// Grades a selection given in shuffled positions.
    pub fn submit(&mut self, selected: &BTreeSet<usize>) -> Result<Verdict, InvalidTransition> {
        let SessionState::AwaitingSelection(index) = self.state else {
            return Err(self.invalid("submit an answer"));
        };
        let Some(shuffled) = self.current.as_ref() else {
            return Err(self.invalid("submit an answer"));
        };

        let correct = grade(selected, &shuffled.correct_options);
        let verdict = Verdict {
            correct,
            correct_options: correct_indices(&shuffled.correct_options)
                .into_iter()
                .collect(),
        };

        if correct {
            self.score += 1;
        }
        self.state = SessionState::Submitted { index, correct };
        Ok(verdict)
    }

    /// Moves past an answered question.
    pub fn advance(&mut self) -> Result<SessionState, InvalidTransition> {
        let SessionState::Submitted { index, .. } = self.state else {
            return Err(self.invalid("advance"));
        };

        self.current = None;
        self.state = if index + 1 < self.items.len() {
            SessionState::Presenting(index + 1)
        } else {
            SessionState::Finished
        };
        Ok(self.state)
    }

    fn invalid(&self, action: &'static str) -> InvalidTransition {
        InvalidTransition {
            action,
            state: self.state,
        }
    }
}
