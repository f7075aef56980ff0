#![forbid(unsafe_code)]

pub mod advice;
pub mod config;
pub mod content_loader;
pub mod error;
pub mod provider;
pub mod session;

pub use advice::QuizAdvisor;
pub use config::ProviderConfig;
pub use content_loader::ContentLoader;
pub use error::{ConfigError, ProviderError, SessionError};
pub use provider::{ChatCompletionsProvider, ContentProvider};
pub use session::{CourseEvent, CourseSession, ProgressUpdate, QuizSubmission};
