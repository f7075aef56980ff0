//! Content provider contract and the HTTP implementation.

mod chat;
pub mod prompts;
mod wire;

use async_trait::async_trait;
use url::Url;

use course_core::model::{Game, Quiz, QuizMistake, Syllabus, TutorialContent};

use crate::error::ProviderError;

pub use chat::ChatCompletionsProvider;

/// Generative content source behind the course.
///
/// Every method returns validated domain values; implementations must reject
/// output that does not match the expected shape with a malformed
/// `ProviderError` instead of returning partial data.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Outline a course for `topic`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the request fails or the response is malformed.
    async fn generate_syllabus(&self, topic: &str) -> Result<Syllabus, ProviderError>;

    /// Write the tutorial for one sub-topic.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the request fails or the response is malformed.
    async fn generate_tutorial(
        &self,
        sub_topic_title: &str,
        description: &str,
    ) -> Result<TutorialContent, ProviderError>;

    /// Write the ten-question quiz for one sub-topic.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the request fails or the response is malformed.
    async fn generate_quiz(&self, sub_topic_title: &str) -> Result<Quiz, ProviderError>;

    /// Design a mini-game for a completed module.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the request fails or the response is malformed.
    async fn generate_game(&self, module_title: &str) -> Result<Game, ProviderError>;

    /// Short study advice based on the questions a learner got wrong.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the request fails or the response is malformed.
    async fn generate_quiz_advice(
        &self,
        sub_topic_title: &str,
        mistakes: &[QuizMistake],
    ) -> Result<String, ProviderError>;

    /// Produce an illustration and return where it can be fetched.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the request fails or the response is malformed.
    async fn generate_image(&self, prompt: &str) -> Result<Url, ProviderError>;
}
