//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{QuizError, SubTopicRef};
use course_core::{ContentError, ProgressionError};

/// Errors emitted by a `ContentProvider`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("content provider unavailable: {0}")]
    Unavailable(String),
    #[error("content provider request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("content provider returned an empty response")]
    EmptyResponse,
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed response: {0}")]
    Content(#[from] ContentError),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// True when the provider answered but the payload did not match the
    /// expected shape.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::EmptyResponse | Self::Json(_) | Self::Content(_) | Self::Malformed(_)
        )
    }

    /// True for transport and service failures.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::HttpStatus(_) | Self::Http(_)
        )
    }
}

/// Errors emitted by `CourseSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("topic cannot be empty")]
    EmptyTopic,
    #[error("no course has been generated yet")]
    NoCourse,
    #[error("course was replaced while the request was in flight")]
    Superseded,
    #[error("failed to generate a syllabus: {0}")]
    Syllabus(#[source] ProviderError),
    #[error("failed to load content for sub-topic {at}: {source}")]
    ContentLoadFailed {
        at: SubTopicRef,
        #[source]
        source: ProviderError,
    },
    #[error("sub-topic {0} has no quiz loaded")]
    QuizNotLoaded(SubTopicRef),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Errors raised while validating configuration at startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} must be set")]
    MissingApiKey { var: &'static str },
    #[error("invalid base url {raw:?}: {source}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid value {raw:?} for {var}")]
    InvalidValue { var: &'static str, raw: String },
    #[error(transparent)]
    HttpClient(#[from] reqwest::Error),
}
