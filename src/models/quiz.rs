// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::quiz::QuestionView;

/// Query parameters for starting a practice quiz.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StartQuizParams {
    #[validate(range(min = 1, max = 50))]
    pub count: Option<i64>,
}

/// Selection for the question currently on screen, in shuffled positions.
#[derive(Debug, Deserialize, Validate)]
pub struct QuizAnswerRequest {
    #[validate(length(min = 1, max = 5, message = "Select at least one option"))]
    pub selected: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct StartQuizResponse {
    pub session_id: Uuid,
    pub total: usize,
    pub question: QuestionView,
}

/// Verdict for one quiz question plus what comes next.
#[derive(Debug, Serialize)]
pub struct QuizStepResponse {
    pub correct: bool,
    pub correct_options: Vec<usize>,
    pub score: usize,
    pub total: usize,
    /// Next question, absent once the quiz is over.
    pub next: Option<QuestionView>,
    pub finished: bool,
}
