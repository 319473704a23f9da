// src/quiz/mod.rs
//
// Practice quizzes: shuffled questions graded locally, no XP.

pub mod registry;
pub mod session;

pub use registry::QuizSessions;
pub use session::{InvalidTransition, QuestionView, QuizItem, QuizSession, SessionState, Verdict};
