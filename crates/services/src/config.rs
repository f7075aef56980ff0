use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "COURSE_AI_API_KEY";
pub const BASE_URL_VAR: &str = "COURSE_AI_BASE_URL";
pub const MODEL_VAR: &str = "COURSE_AI_MODEL";
pub const TUTORIAL_MODEL_VAR: &str = "COURSE_AI_TUTORIAL_MODEL";
pub const IMAGE_MODEL_VAR: &str = "COURSE_AI_IMAGE_MODEL";
pub const IMAGES_VAR: &str = "COURSE_AI_IMAGES";
pub const TIMEOUT_VAR: &str = "COURSE_AI_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TUTORIAL_MODEL: &str = "gpt-4o";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection and model settings for the content provider.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub base_url: Url,
    pub api_key: String,
    /// Model used for syllabus, quiz, game and advice requests.
    pub model: String,
    /// Model used for tutorials, which are the longest generations.
    pub tutorial_model: String,
    pub image_model: String,
    pub images_enabled: bool,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingApiKey` if no API key is set, or another
    /// `ConfigError` for values that fail to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ProviderConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::MissingApiKey { var: API_KEY_VAR })?;

        let raw_base = get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let base_url = Url::parse(&raw_base).map_err(|source| ConfigError::InvalidBaseUrl {
            raw: raw_base.clone(),
            source,
        })?;

        let images_enabled = match get(IMAGES_VAR).as_deref() {
            None | Some("0" | "false" | "no" | "off") => false,
            Some("1" | "true" | "yes" | "on") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: IMAGES_VAR,
                    raw: other.to_string(),
                });
            }
        };

        let timeout_secs = match get(TIMEOUT_VAR) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: TIMEOUT_VAR,
                    raw,
                })?,
        };

        Ok(Self {
            base_url,
            api_key,
            model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.into()),
            tutorial_model: get(TUTORIAL_MODEL_VAR)
                .unwrap_or_else(|| DEFAULT_TUTORIAL_MODEL.into()),
            image_model: get(IMAGE_MODEL_VAR).unwrap_or_else(|| DEFAULT_IMAGE_MODEL.into()),
            images_enabled,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// `{base_url}/{path}` without doubling slashes.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn missing_api_key_fails_fast() {
        let err = ProviderConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingApiKey {
                var: "COURSE_AI_API_KEY"
            }
        ));

        let err = ProviderConfig::from_lookup(lookup(&[(API_KEY_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { .. }));
    }

    #[test]
    fn defaults_apply() {
        let config = ProviderConfig::from_lookup(lookup(&[(API_KEY_VAR, "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.tutorial_model, "gpt-4o");
        assert!(!config.images_enabled);
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(
            config.endpoint("chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn overrides_apply() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "sk-test"),
            (BASE_URL_VAR, "http://localhost:8080/v1/"),
            (MODEL_VAR, "small"),
            (IMAGES_VAR, "yes"),
            (TIMEOUT_VAR, "30"),
        ]))
        .unwrap();
        assert_eq!(config.model, "small");
        assert!(config.images_enabled);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(
            config.endpoint("/images/generations"),
            "http://localhost:8080/v1/images/generations"
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ProviderConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "sk-test"),
            (BASE_URL_VAR, "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

        let err = ProviderConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "sk-test"),
            (TIMEOUT_VAR, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "COURSE_AI_TIMEOUT_SECS",
                ..
            }
        ));
    }
}
