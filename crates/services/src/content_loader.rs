use std::sync::Arc;

use futures::future::join_all;

use course_core::model::{SubTopic, SubTopicContent, TutorialContent};

use crate::error::ProviderError;
use crate::provider::{ContentProvider, prompts};

/// Fetches tutorial and quiz for a sub-topic, at most once.
#[derive(Clone)]
pub struct ContentLoader {
    provider: Arc<dyn ContentProvider>,
    images: bool,
}

impl ContentLoader {
    #[must_use]
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            provider,
            images: false,
        }
    }

    /// Illustrate tutorials that come back without images.
    #[must_use]
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.images = enabled;
        self
    }

    /// Return the sub-topic's content, generating it if it has none yet.
    ///
    /// Tutorial and quiz are requested concurrently; if either fails nothing
    /// is returned, so callers never see half-loaded content.
    ///
    /// # Errors
    ///
    /// Returns the first `ProviderError` raised by either request.
    pub async fn ensure_content(
        &self,
        sub_topic: &SubTopic,
    ) -> Result<SubTopicContent, ProviderError> {
        if let Some(content) = sub_topic.content() {
            return Ok(content.clone());
        }

        let title = sub_topic.title();
        tracing::info!(sub_topic = title, "generating tutorial and quiz");
        let (tutorial, quiz) = tokio::try_join!(
            self.provider.generate_tutorial(title, sub_topic.description()),
            self.provider.generate_quiz(title),
        )?;

        let tutorial = if self.images {
            self.illustrate(title, tutorial).await
        } else {
            tutorial
        };
        Ok(SubTopicContent { tutorial, quiz })
    }

    /// Fill in missing images. Failures leave the image out.
    async fn illustrate(
        &self,
        sub_topic_title: &str,
        tutorial: TutorialContent,
    ) -> TutorialContent {
        let missing: Vec<usize> = tutorial.concepts_missing_images().collect();
        let concept_prompts: Vec<String> = missing
            .iter()
            .map(|&index| {
                prompts::concept_image(sub_topic_title, tutorial.core_concepts()[index].title())
            })
            .collect();

        let intro = async {
            if tutorial.intro_image_url().is_some() {
                return None;
            }
            match self
                .provider
                .generate_image(&prompts::intro_image(sub_topic_title))
                .await
            {
                Ok(url) => Some(url),
                Err(err) => {
                    tracing::warn!(sub_topic = sub_topic_title, error = %err, "intro image failed");
                    None
                }
            }
        };
        let concepts = join_all(
            concept_prompts
                .iter()
                .map(|prompt| self.provider.generate_image(prompt)),
        );
        let (intro, concepts) = tokio::join!(intro, concepts);

        let mut tutorial = match intro {
            Some(url) => tutorial.with_intro_image(Some(url)),
            None => tutorial,
        };
        for (index, result) in missing.into_iter().zip(concepts) {
            match result {
                Ok(url) => tutorial = tutorial.with_concept_image(index, url),
                Err(err) => {
                    tracing::warn!(
                        sub_topic = sub_topic_title,
                        concept = index,
                        error = %err,
                        "concept image failed"
                    );
                }
            }
        }
        tutorial
    }
}
