use std::sync::Arc;

use course_core::model::QuizMistake;

use crate::provider::ContentProvider;

/// Shown when every answer was right; no request is made.
pub const PERFECT_SCORE_ADVICE: &str =
    "Perfect score! You have a solid grasp of this topic, so keep going.";

/// Shown when advice could not be generated.
pub const FALLBACK_ADVICE: &str =
    "Review the questions you missed and re-read the tutorial before trying again.";

/// Turns quiz mistakes into a short study hint.
#[derive(Clone)]
pub struct QuizAdvisor {
    provider: Arc<dyn ContentProvider>,
}

impl QuizAdvisor {
    #[must_use]
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider }
    }

    /// Never fails: provider errors are logged and replaced by
    /// [`FALLBACK_ADVICE`].
    pub async fn advise(&self, sub_topic_title: &str, mistakes: &[QuizMistake]) -> String {
        if mistakes.is_empty() {
            return PERFECT_SCORE_ADVICE.to_string();
        }
        match self
            .provider
            .generate_quiz_advice(sub_topic_title, mistakes)
            .await
        {
            Ok(advice) => advice,
            Err(err) => {
                tracing::warn!(sub_topic = sub_topic_title, error = %err, "quiz advice failed");
                FALLBACK_ADVICE.to_string()
            }
        }
    }
}
