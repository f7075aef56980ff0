#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod progression;

pub use error::ContentError;
pub use progression::{ProgressionError, QuizPass};
