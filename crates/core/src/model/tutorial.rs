use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ContentError, require_text};
use crate::model::quiz::QuizQuestion;

/// The single check-your-understanding question shown inside a tutorial.
///
/// Same shape and validation rules as a quiz question.
pub type InteractiveCheck = QuizQuestion;

/// One titled concept section of a tutorial. `explanation` is Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConcept {
    title: String,
    explanation: String,
    image_url: Option<Url>,
}

impl CoreConcept {
    /// # Errors
    ///
    /// Returns `ContentError::EmptyText` if the title or explanation is blank.
    pub fn new(
        title: impl Into<String>,
        explanation: impl Into<String>,
        image_url: Option<Url>,
    ) -> Result<Self, ContentError> {
        Ok(Self {
            title: require_text("concept title", title.into())?,
            explanation: require_text("concept explanation", explanation.into())?,
            image_url,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }
}

/// Generated tutorial for a sub-topic. Text fields are Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialContent {
    introduction: String,
    intro_image_url: Option<Url>,
    core_concepts: Vec<CoreConcept>,
    key_takeaway: String,
    interactive_check: InteractiveCheck,
}

impl TutorialContent {
    /// # Errors
    ///
    /// Returns `ContentError` if the introduction or takeaway is blank or no
    /// core concepts are given.
    pub fn new(
        introduction: impl Into<String>,
        core_concepts: Vec<CoreConcept>,
        key_takeaway: impl Into<String>,
        interactive_check: InteractiveCheck,
    ) -> Result<Self, ContentError> {
        if core_concepts.is_empty() {
            return Err(ContentError::NoCoreConcepts);
        }
        Ok(Self {
            introduction: require_text("introduction", introduction.into())?,
            intro_image_url: None,
            core_concepts,
            key_takeaway: require_text("key takeaway", key_takeaway.into())?,
            interactive_check,
        })
    }

    #[must_use]
    pub fn with_intro_image(mut self, url: Option<Url>) -> Self {
        self.intro_image_url = url;
        self
    }

    /// Attach an image to the concept at `index`. Out-of-range indices are ignored.
    #[must_use]
    pub fn with_concept_image(mut self, index: usize, url: Url) -> Self {
        if let Some(concept) = self.core_concepts.get_mut(index) {
            concept.image_url = Some(url);
        }
        self
    }

    #[must_use]
    pub fn introduction(&self) -> &str {
        &self.introduction
    }

    #[must_use]
    pub fn intro_image_url(&self) -> Option<&Url> {
        self.intro_image_url.as_ref()
    }

    #[must_use]
    pub fn core_concepts(&self) -> &[CoreConcept] {
        &self.core_concepts
    }

    #[must_use]
    pub fn key_takeaway(&self) -> &str {
        &self.key_takeaway
    }

    #[must_use]
    pub fn interactive_check(&self) -> &InteractiveCheck {
        &self.interactive_check
    }

    /// Indices of concepts that still have no image.
    pub fn concepts_missing_images(&self) -> impl Iterator<Item = usize> + '_ {
        self.core_concepts
            .iter()
            .enumerate()
            .filter(|(_, concept)| concept.image_url.is_none())
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::quiz::tests::question;

    pub(crate) fn tutorial(title: &str) -> TutorialContent {
        TutorialContent::new(
            format!("Welcome to **{title}**."),
            vec![
                CoreConcept::new("First idea", "Explained.", None).unwrap(),
                CoreConcept::new("Second idea", "Also explained.", None).unwrap(),
            ],
            "Remember this.",
            question(0),
        )
        .unwrap()
    }

    #[test]
    fn tutorial_requires_concepts() {
        let err = TutorialContent::new("intro", vec![], "takeaway", question(0)).unwrap_err();
        assert_eq!(err, ContentError::NoCoreConcepts);
    }

    #[test]
    fn blank_introduction_is_rejected() {
        let concepts = vec![CoreConcept::new("t", "e", None).unwrap()];
        let err = TutorialContent::new("  ", concepts, "takeaway", question(0)).unwrap_err();
        assert_eq!(
            err,
            ContentError::EmptyText {
                field: "introduction"
            }
        );
    }

    #[test]
    fn concept_images_fill_missing_slots() {
        let url = Url::parse("https://images.example.com/a.png").unwrap();
        let tutorial = tutorial("Rust");
        assert_eq!(tutorial.concepts_missing_images().collect::<Vec<_>>(), [0, 1]);

        let tutorial = tutorial
            .with_concept_image(1, url.clone())
            .with_concept_image(9, url.clone());
        assert_eq!(tutorial.concepts_missing_images().collect::<Vec<_>>(), [0]);
        assert_eq!(tutorial.core_concepts()[1].image_url(), Some(&url));
    }
}
