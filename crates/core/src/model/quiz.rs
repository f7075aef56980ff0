use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ContentError, require_text};

/// Number of questions in every sub-topic quiz.
pub const QUIZ_LENGTH: usize = 10;

/// Number of options offered for each multiple-choice question.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Minimum number of correct answers needed to pass a quiz.
pub const PASS_THRESHOLD: usize = 7;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while a learner works through a quiz attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question {index} does not exist")]
    UnknownQuestion { index: usize },

    #[error("{option:?} is not an option for question {index}")]
    UnknownOption { index: usize, option: String },

    #[error("{answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },

    #[error("attempt already submitted")]
    AlreadySubmitted,

    #[error("attempt not submitted yet")]
    NotSubmitted,
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// A multiple-choice question whose correct answer is one of its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: String,
}

impl QuizQuestion {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the text is empty, the option count is not
    /// `OPTIONS_PER_QUESTION`, or the correct answer is not one of the options.
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, ContentError> {
        let question = require_text("question", question.into())?;
        if options.len() != OPTIONS_PER_QUESTION {
            return Err(ContentError::WrongOptionCount {
                question,
                expected: OPTIONS_PER_QUESTION,
                found: options.len(),
            });
        }
        let correct_answer = correct_answer.into();
        if !options.iter().any(|option| *option == correct_answer) {
            return Err(ContentError::CorrectAnswerNotAnOption {
                answer: correct_answer,
            });
        }
        Ok(Self {
            question,
            options,
            correct_answer,
        })
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Exact string comparison, no normalization.
    #[must_use]
    pub fn is_correct(&self, selected: &str) -> bool {
        self.correct_answer == selected
    }

    fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// The ordered question set attached to a sub-topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz(Vec<QuizQuestion>);

impl Quiz {
    /// Build a quiz with exactly `QUIZ_LENGTH` questions.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::WrongQuestionCount` for any other length.
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, ContentError> {
        if questions.len() != QUIZ_LENGTH {
            return Err(ContentError::WrongQuestionCount {
                expected: QUIZ_LENGTH,
                found: questions.len(),
            });
        }
        Ok(Self(questions))
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count of selections that exactly match the correct answer.
    #[must_use]
    pub fn score(&self, selections: &[Option<String>]) -> usize {
        self.0
            .iter()
            .zip(selections)
            .filter(|(question, selected)| {
                selected
                    .as_deref()
                    .is_some_and(|selected| question.is_correct(selected))
            })
            .count()
    }
}

//
// ─── ATTEMPTS ──────────────────────────────────────────────────────────────────
//

/// Outcome of a submitted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
}

impl QuizResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.score >= PASS_THRESHOLD
    }
}

/// A question the learner answered incorrectly, used to ask for advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizMistake {
    pub question: String,
    pub wrong_answer: String,
    pub correct_answer: String,
}

/// A learner's in-progress or submitted answers to one quiz.
///
/// Retrying clears every selection but keeps the same questions; the quiz is
/// never re-fetched for a retry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuizAttempt {
    selections: Vec<Option<String>>,
    submitted: bool,
}

impl QuizAttempt {
    #[must_use]
    pub fn new(quiz: &Quiz) -> Self {
        Self {
            selections: vec![None; quiz.len()],
            submitted: false,
        }
    }

    /// Select an option for a question, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadySubmitted` once submitted, or
    /// `UnknownQuestion` / `UnknownOption` for selections outside the quiz.
    pub fn select(&mut self, quiz: &Quiz, index: usize, option: &str) -> Result<(), QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        let question = quiz
            .questions()
            .get(index)
            .ok_or(QuizError::UnknownQuestion { index })?;
        if !question.has_option(option) {
            return Err(QuizError::UnknownOption {
                index,
                option: option.to_string(),
            });
        }
        let slot = self
            .selections
            .get_mut(index)
            .ok_or(QuizError::UnknownQuestion { index })?;
        *slot = Some(option.to_string());
        Ok(())
    }

    #[must_use]
    pub fn selection(&self, index: usize) -> Option<&str> {
        self.selections.get(index).and_then(Option::as_deref)
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.selections.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Submit the attempt and score it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Incomplete` until every question has a selection,
    /// and `AlreadySubmitted` when called twice without a retry.
    pub fn submit(&mut self, quiz: &Quiz) -> Result<QuizResult, QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        let answered = self.answered();
        if answered != quiz.len() {
            return Err(QuizError::Incomplete {
                answered,
                total: quiz.len(),
            });
        }
        self.submitted = true;
        Ok(self.score(quiz))
    }

    /// Result of a submitted attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotSubmitted` before `submit`.
    pub fn result(&self, quiz: &Quiz) -> Result<QuizResult, QuizError> {
        if !self.submitted {
            return Err(QuizError::NotSubmitted);
        }
        Ok(self.score(quiz))
    }

    /// Clear all selections and the submitted flag.
    pub fn retry(&mut self) {
        self.selections.iter_mut().for_each(|s| *s = None);
        self.submitted = false;
    }

    /// Incorrect answers, in question order. Unanswered questions are skipped.
    #[must_use]
    pub fn mistakes(&self, quiz: &Quiz) -> Vec<QuizMistake> {
        quiz.questions()
            .iter()
            .zip(&self.selections)
            .filter_map(|(question, selected)| {
                let selected = selected.as_deref()?;
                (!question.is_correct(selected)).then(|| QuizMistake {
                    question: question.question().to_string(),
                    wrong_answer: selected.to_string(),
                    correct_answer: question.correct_answer().to_string(),
                })
            })
            .collect()
    }

    fn score(&self, quiz: &Quiz) -> QuizResult {
        QuizResult {
            score: quiz.score(&self.selections),
            total: quiz.len(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
