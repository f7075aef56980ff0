//! Response shapes requested from the model, and their conversion into
//! validated domain values.

use schemars::JsonSchema;
use serde::Deserialize;
use url::Url;

use course_core::model::{
    CoreConcept, FillInTheBlank, Game, GameData, GameKind, MatchingPair, Quiz, QuizQuestion,
    Syllabus, SyllabusModule, SyllabusSubTopic, TrueFalseStatement, TutorialContent,
};

use crate::error::ProviderError;

//
// ─── SYLLABUS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SyllabusResponse {
    /// Main title of the course.
    syllabus_title: String,
    /// Course modules in teaching order.
    modules: Vec<ModuleOutline>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ModuleOutline {
    module_title: String,
    /// Sub-topics of the module in teaching order.
    sub_topics: Vec<SubTopicOutline>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SubTopicOutline {
    sub_topic_title: String,
    /// One-sentence description of the sub-topic.
    description: String,
}

impl SyllabusResponse {
    pub(crate) fn into_syllabus(self) -> Result<Syllabus, ProviderError> {
        let syllabus = Syllabus {
            title: self.syllabus_title,
            modules: self
                .modules
                .into_iter()
                .map(|module| SyllabusModule {
                    title: module.module_title,
                    sub_topics: module
                        .sub_topics
                        .into_iter()
                        .map(|sub_topic| SyllabusSubTopic {
                            title: sub_topic.sub_topic_title,
                            description: sub_topic.description,
                        })
                        .collect(),
                })
                .collect(),
        };
        Ok(syllabus.validate()?)
    }
}

//
// ─── TUTORIAL & QUIZ ───────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionResponse {
    question: String,
    /// Exactly four possible answers.
    options: Vec<String>,
    /// Must equal one of the options.
    correct_answer: String,
}

impl QuestionResponse {
    fn into_question(self) -> Result<QuizQuestion, ProviderError> {
        Ok(QuizQuestion::new(
            self.question,
            self.options,
            self.correct_answer,
        )?)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TutorialResponse {
    /// Engaging introduction in Markdown.
    introduction: String,
    /// Optional illustration for the introduction.
    #[serde(default)]
    intro_image_url: Option<String>,
    core_concepts: Vec<ConceptResponse>,
    /// Most important point in Markdown.
    key_takeaway: String,
    interactive_check: QuestionResponse,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ConceptResponse {
    title: String,
    /// Detailed explanation in Markdown.
    explanation: String,
    #[serde(default)]
    image_url: Option<String>,
}

impl TutorialResponse {
    pub(crate) fn into_tutorial(self) -> Result<TutorialContent, ProviderError> {
        let concepts = self
            .core_concepts
            .into_iter()
            .map(|concept| {
                CoreConcept::new(
                    concept.title,
                    concept.explanation,
                    concept.image_url.as_deref().and_then(image_url),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let tutorial = TutorialContent::new(
            self.introduction,
            concepts,
            self.key_takeaway,
            self.interactive_check.into_question()?,
        )?;
        Ok(tutorial.with_intro_image(self.intro_image_url.as_deref().and_then(image_url)))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(crate) struct QuizResponse {
    /// Exactly ten questions.
    questions: Vec<QuestionResponse>,
}

impl QuizResponse {
    pub(crate) fn into_quiz(self) -> Result<Quiz, ProviderError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionResponse::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Quiz::new(questions)?)
    }
}

/// Image links are decorative: anything that is not an absolute http(s) URL
/// is dropped instead of failing the tutorial.
fn image_url(raw: &str) -> Option<Url> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        _ => {
            tracing::debug!(raw, "ignoring unusable image url");
            None
        }
    }
}

//
// ─── GAME ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GameResponse {
    /// One of "matching", "fill-in-the-blanks", "true-false".
    game_type: String,
    game_title: String,
    /// Brief instructions on how to play.
    instructions: String,
    /// At least five items; fields depend on gameType.
    data: Vec<GameItemResponse>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GameItemResponse {
    term: Option<String>,
    definition: Option<String>,
    sentence: Option<String>,
    answer: Option<String>,
    statement: Option<String>,
    is_true: Option<bool>,
}

fn field<T>(
    value: Option<T>,
    kind: GameKind,
    name: &str,
    index: usize,
) -> Result<T, ProviderError> {
    value.ok_or_else(|| ProviderError::Malformed(format!("{kind} item {index} is missing {name}")))
}

impl GameResponse {
    pub(crate) fn into_game(self, module_title: &str) -> Result<Game, ProviderError> {
        let kind = GameKind::from_tag(self.game_type.trim()).ok_or_else(|| {
            ProviderError::Malformed(format!("unknown game type {:?}", self.game_type))
        })?;
        let items = self.data.into_iter().enumerate();
        let data = match kind {
            GameKind::Matching => GameData::Matching(
                items
                    .map(|(i, item)| {
                        Ok(MatchingPair {
                            term: field(item.term, kind, "term", i)?,
                            definition: field(item.definition, kind, "definition", i)?,
                        })
                    })
                    .collect::<Result<_, ProviderError>>()?,
            ),
            GameKind::FillInTheBlanks => GameData::FillInTheBlanks(
                items
                    .map(|(i, item)| {
                        Ok(FillInTheBlank {
                            sentence: field(item.sentence, kind, "sentence", i)?,
                            answer: field(item.answer, kind, "answer", i)?,
                        })
                    })
                    .collect::<Result<_, ProviderError>>()?,
            ),
            GameKind::TrueFalse => GameData::TrueFalse(
                items
                    .map(|(i, item)| {
                        Ok(TrueFalseStatement {
                            statement: field(item.statement, kind, "statement", i)?,
                            is_true: field(item.is_true, kind, "isTrue", i)?,
                        })
                    })
                    .collect::<Result<_, ProviderError>>()?,
            ),
        };
        Ok(Game::new(
            module_title,
            self.game_title,
            self.instructions,
            data,
        )?)
    }
}

//
// ─── ADVICE & IMAGES ───────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize, JsonSchema)]
pub(crate) struct AdviceResponse {
    /// Two or three sentences of study advice.
    pub(crate) advice: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageResponse {
    pub(crate) data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageDatum {
    pub(crate) url: Option<String>,
}

/// Models sometimes wrap JSON in a Markdown code fence even when asked not to.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    // Any other language tag runs to the end of the opening line.
    let rest = match rest.find('\n') {
        Some(newline)
            if !rest[..newline].trim().is_empty()
                && !rest.trim_start().starts_with(['{', '[']) =>
        {
            &rest[newline + 1..]
        }
        _ => rest,
    };
    let body = rest.trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(n: usize) -> serde_json::Value {
        json!({
            "question": format!("Q{n}?"),
            "options": ["a", "b", "c", "d"],
            "correctAnswer": "b",
        })
    }

    fn game(game_type: &str, item: serde_json::Value, count: usize) -> GameResponse {
        serde_json::from_value(json!({
            "gameType": game_type,
            "gameTitle": "Review",
            "instructions": "Play it.",
            "data": vec![item; count],
        }))
        .unwrap()
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  ```\n{\"a\": 1}\n```  \n"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```JSON {\"a\": [1]}\n```"), "{\"a\": [1]}");
        assert_eq!(strip_code_fence("```javascript\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn syllabus_maps_camel_case_fields() {
        let response: SyllabusResponse = serde_json::from_value(json!({
            "syllabusTitle": "Rust",
            "modules": [{
                "moduleTitle": "Basics",
                "subTopics": [{"subTopicTitle": "Variables", "description": "Bindings."}],
            }],
        }))
        .unwrap();

        let syllabus = response.into_syllabus().unwrap();
        assert_eq!(syllabus.title, "Rust");
        assert_eq!(syllabus.modules[0].title, "Basics");
        assert_eq!(syllabus.modules[0].sub_topics[0].title, "Variables");
    }

    #[test]
    fn empty_syllabus_is_malformed() {
        let response: SyllabusResponse =
            serde_json::from_value(json!({"syllabusTitle": "Rust", "modules": []})).unwrap();
        assert!(response.into_syllabus().unwrap_err().is_malformed());
    }

    #[test]
    fn quiz_with_nine_questions_is_malformed() {
        let questions: Vec<_> = (0..9).map(question).collect();
        let response: QuizResponse =
            serde_json::from_value(json!({ "questions": questions })).unwrap();
        assert!(response.into_quiz().unwrap_err().is_malformed());
    }

    #[test]
    fn quiz_answer_outside_options_is_malformed() {
        let mut questions: Vec<_> = (0..10).map(question).collect();
        questions[3]["correctAnswer"] = json!("z");
        let response: QuizResponse =
            serde_json::from_value(json!({ "questions": questions })).unwrap();
        assert!(response.into_quiz().unwrap_err().is_malformed());
    }

    #[test]
    fn tutorial_drops_unusable_image_urls() {
        let response: TutorialResponse = serde_json::from_value(json!({
            "introduction": "Hello",
            "introImageUrl": "not a url",
            "coreConcepts": [
                {"title": "A", "explanation": "x", "imageUrl": "https://img.example.com/a.png"},
                {"title": "B", "explanation": "y", "imageUrl": "ftp://img.example.com/b.png"},
            ],
            "keyTakeaway": "Bye",
            "interactiveCheck": question(0),
        }))
        .unwrap();

        let tutorial = response.into_tutorial().unwrap();
        assert!(tutorial.intro_image_url().is_none());
        assert_eq!(
            tutorial.core_concepts()[0].image_url().map(Url::as_str),
            Some("https://img.example.com/a.png")
        );
        assert!(tutorial.core_concepts()[1].image_url().is_none());
    }

    #[test]
    fn game_items_follow_game_type() {
        let response = game(
            "fill-in-the-blanks",
            json!({"sentence": "Rust has no ___.", "answer": "GC"}),
            5,
        );
        let game = response.into_game("Memory").unwrap();
        assert_eq!(game.kind(), GameKind::FillInTheBlanks);
        assert_eq!(game.module_title(), "Memory");
        assert_eq!(game.data().len(), 5);
    }

    #[test]
    fn game_with_wrong_item_shape_is_malformed() {
        let response = game("true-false", json!({"term": "t", "definition": "d"}), 5);
        let err = response.into_game("Memory").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(ref msg) if msg.contains("statement")));
    }

    #[test]
    fn unknown_game_type_or_too_few_items_is_malformed() {
        let response = game("crossword", json!({"term": "t", "definition": "d"}), 5);
        assert!(response.into_game("Memory").unwrap_err().is_malformed());

        let response = game("matching", json!({"term": "t", "definition": "d"}), 4);
        assert!(response.into_game("Memory").unwrap_err().is_malformed());
    }
}
