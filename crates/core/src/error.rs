use thiserror::Error;

/// Validation failures for generated content.
///
/// Raised while turning provider output into domain values, so a malformed
/// response never reaches the course model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("{field} cannot be empty")]
    EmptyText { field: &'static str },

    #[error("question {question:?} must have {expected} options, found {found}")]
    WrongOptionCount {
        question: String,
        expected: usize,
        found: usize,
    },

    #[error("correct answer {answer:?} is not one of the options")]
    CorrectAnswerNotAnOption { answer: String },

    #[error("quiz must have {expected} questions, found {found}")]
    WrongQuestionCount { expected: usize, found: usize },

    #[error("tutorial must contain at least one core concept")]
    NoCoreConcepts,

    #[error("game must contain at least {min} items, found {found}")]
    TooFewGameItems { min: usize, found: usize },

    #[error("syllabus must contain at least one module")]
    EmptySyllabus,

    #[error("module {title:?} has no sub-topics")]
    EmptyModule { title: String },
}

pub(crate) fn require_text(field: &'static str, value: String) -> Result<String, ContentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ContentError::EmptyText { field });
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}
