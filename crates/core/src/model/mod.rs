pub(crate) mod course;
pub mod game;
mod ids;
pub mod quiz;
mod tutorial;

pub use course::{
    Course, CourseProgress, Module, SubTopic, SubTopicContent, SubTopicState, Syllabus,
    SyllabusModule, SyllabusSubTopic,
};
pub use game::{
    FillInTheBlank, Game, GameAnswer, GameAttempt, GameCollection, GameData, GameError, GameKind,
    GameResult, MIN_GAME_ITEMS, MatchingPair, TrueFalseStatement,
};
pub use ids::SubTopicRef;
pub use quiz::{
    OPTIONS_PER_QUESTION, PASS_THRESHOLD, QUIZ_LENGTH, Quiz, QuizAttempt, QuizError, QuizMistake,
    QuizQuestion, QuizResult,
};
pub use tutorial::{CoreConcept, InteractiveCheck, TutorialContent};
