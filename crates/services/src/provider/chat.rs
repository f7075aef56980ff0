use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use course_core::model::{Game, Quiz, QuizMistake, Syllabus, TutorialContent};

use super::wire::{
    AdviceResponse, GameResponse, ImageResponse, QuizResponse, SyllabusResponse, TutorialResponse,
    strip_code_fence,
};
use super::{ContentProvider, prompts};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError};

const TEMPERATURE: f32 = 0.7;
const IMAGE_SIZE: &str = "1024x1024";

/// `ContentProvider` backed by an OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct ChatCompletionsProvider {
    client: Client,
    config: ProviderConfig,
}

impl ChatCompletionsProvider {
    /// # Errors
    ///
    /// Returns `ConfigError` when configuration is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ProviderConfig::from_env()?)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::HttpClient` if the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Ask for a JSON reply shaped like `T` and decode it.
    async fn complete<T>(&self, model: &str, name: &str, prompt: String) -> Result<T, ProviderError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let payload = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name,
                    strict: false,
                    schema: serde_json::to_value(schemars::schema_for!(T))?,
                },
            },
        };

        tracing::debug!(model, schema = name, "requesting completion");
        let response = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(model, schema = name, status = %response.status(), "completion failed");
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: ChatResponse = decode_body(response).await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(serde_json::from_str(strip_code_fence(&content))?)
    }
}

#[async_trait]
impl ContentProvider for ChatCompletionsProvider {
    async fn generate_syllabus(&self, topic: &str) -> Result<Syllabus, ProviderError> {
        self.complete::<SyllabusResponse>(&self.config.model, "syllabus", prompts::syllabus(topic))
            .await?
            .into_syllabus()
    }

    async fn generate_tutorial(
        &self,
        sub_topic_title: &str,
        description: &str,
    ) -> Result<TutorialContent, ProviderError> {
        self.complete::<TutorialResponse>(
            &self.config.tutorial_model,
            "tutorial",
            prompts::tutorial(sub_topic_title, description),
        )
        .await?
        .into_tutorial()
    }

    async fn generate_quiz(&self, sub_topic_title: &str) -> Result<Quiz, ProviderError> {
        self.complete::<QuizResponse>(&self.config.model, "quiz", prompts::quiz(sub_topic_title))
            .await?
            .into_quiz()
    }

    async fn generate_game(&self, module_title: &str) -> Result<Game, ProviderError> {
        self.complete::<GameResponse>(&self.config.model, "game", prompts::game(module_title))
            .await?
            .into_game(module_title)
    }

    async fn generate_quiz_advice(
        &self,
        sub_topic_title: &str,
        mistakes: &[QuizMistake],
    ) -> Result<String, ProviderError> {
        let response = self
            .complete::<AdviceResponse>(
                &self.config.model,
                "quiz_advice",
                prompts::quiz_advice(sub_topic_title, mistakes),
            )
            .await?;
        let advice = response.advice.trim();
        if advice.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(advice.to_string())
    }

    async fn generate_image(&self, prompt: &str) -> Result<Url, ProviderError> {
        let payload = ImageRequest {
            model: &self.config.image_model,
            prompt,
            n: 1,
            size: IMAGE_SIZE,
        };

        tracing::debug!(model = %self.config.image_model, "requesting image");
        let response = self
            .client
            .post(self.config.endpoint("images/generations"))
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: ImageResponse = decode_body(response).await?;
        let raw = body
            .data
            .into_iter()
            .next()
            .and_then(|datum| datum.url)
            .ok_or(ProviderError::EmptyResponse)?;
        Url::parse(&raw).map_err(|err| ProviderError::Malformed(format!("image url: {err}")))
    }
}

/// A 2xx body that is not JSON decodes to `ProviderError::Json`.
async fn decode_body<T>(response: reqwest::Response) -> Result<T, ProviderError>
where
    T: DeserializeOwned,
{
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'static str,
}
