use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::{ContentError, require_text};

/// Minimum number of playable items in a generated game.
pub const MIN_GAME_ITEMS: usize = 5;

/// The kinds of mini-game a completed module can unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    Matching,
    FillInTheBlanks,
    TrueFalse,
}

impl GameKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::Matching => "matching",
            GameKind::FillInTheBlanks => "fill-in-the-blanks",
            GameKind::TrueFalse => "true-false",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "matching" => Some(Self::Matching),
            "fill-in-the-blanks" => Some(Self::FillInTheBlanks),
            "true-false" => Some(Self::TrueFalse),
            _ => None,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPair {
    pub term: String,
    pub definition: String,
}

impl MatchingPair {
    #[must_use]
    pub fn matches(&self, definition: &str) -> bool {
        self.definition == definition
    }
}

/// A sentence containing a `___` blank and the word that fills it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillInTheBlank {
    pub sentence: String,
    pub answer: String,
}

impl FillInTheBlank {
    /// Typed answers are compared trimmed and ignoring case.
    #[must_use]
    pub fn accepts(&self, typed: &str) -> bool {
        typed.trim().to_lowercase() == self.answer.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrueFalseStatement {
    pub statement: String,
    pub is_true: bool,
}

impl TrueFalseStatement {
    #[must_use]
    pub fn accepts(&self, pick: bool) -> bool {
        self.is_true == pick
    }
}

/// Game payload, one concrete item shape per game kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game_type", content = "data", rename_all = "kebab-case")]
pub enum GameData {
    Matching(Vec<MatchingPair>),
    FillInTheBlanks(Vec<FillInTheBlank>),
    TrueFalse(Vec<TrueFalseStatement>),
}

impl GameData {
    #[must_use]
    pub fn kind(&self) -> GameKind {
        match self {
            GameData::Matching(_) => GameKind::Matching,
            GameData::FillInTheBlanks(_) => GameKind::FillInTheBlanks,
            GameData::TrueFalse(_) => GameKind::TrueFalse,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            GameData::Matching(items) => items.len(),
            GameData::FillInTheBlanks(items) => items.len(),
            GameData::TrueFalse(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matching definitions in a fixed order unrelated to the terms.
    ///
    /// Empty for other game kinds.
    #[must_use]
    pub fn definitions(&self) -> Vec<&str> {
        let GameData::Matching(pairs) = self else {
            return Vec::new();
        };
        let mut definitions: Vec<&str> = pairs.iter().map(|p| p.definition.as_str()).collect();
        definitions.sort_unstable_by_key(|d| d.to_lowercase());
        definitions
    }

    fn accepts(&self, index: usize, answer: &GameAnswer) -> Result<bool, GameError> {
        let unknown = GameError::UnknownItem { index };
        match (self, answer) {
            (GameData::Matching(pairs), GameAnswer::Definition(definition)) => {
                Ok(pairs.get(index).ok_or(unknown)?.matches(definition))
            }
            (GameData::FillInTheBlanks(items), GameAnswer::Word(word)) => {
                Ok(items.get(index).ok_or(unknown)?.accepts(word))
            }
            (GameData::TrueFalse(items), GameAnswer::Truth(pick)) => {
                Ok(items.get(index).ok_or(unknown)?.accepts(*pick))
            }
            _ => Err(GameError::WrongAnswerKind { kind: self.kind() }),
        }
    }
}

/// A generated mini-game. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    module_title: String,
    title: String,
    instructions: String,
    data: GameData,
}

impl Game {
    /// # Errors
    ///
    /// Returns `ContentError` if the title or instructions are blank or the
    /// payload has fewer than `MIN_GAME_ITEMS` items.
    pub fn new(
        module_title: impl Into<String>,
        title: impl Into<String>,
        instructions: impl Into<String>,
        data: GameData,
    ) -> Result<Self, ContentError> {
        if data.len() < MIN_GAME_ITEMS {
            return Err(ContentError::TooFewGameItems {
                min: MIN_GAME_ITEMS,
                found: data.len(),
            });
        }
        Ok(Self {
            module_title: module_title.into(),
            title: require_text("game title", title.into())?,
            instructions: require_text("game instructions", instructions.into())?,
            data,
        })
    }

    /// Title of the module whose completion produced this game.
    #[must_use]
    pub fn module_title(&self) -> &str {
        &self.module_title
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    #[must_use]
    pub fn kind(&self) -> GameKind {
        self.data.kind()
    }

    #[must_use]
    pub fn data(&self) -> &GameData {
        &self.data
    }
}

/// Append-only list of games in module-completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameCollection {
    games: Vec<Game>,
}

impl GameCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, game: Game) {
        self.games.push(game);
    }

    #[must_use]
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Game> {
        self.games.iter()
    }
}

//
// ─── PLAY ──────────────────────────────────────────────────────────────────────
//

/// Errors raised while a learner plays a game.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameError {
    #[error("item {index} does not exist")]
    UnknownItem { index: usize },

    #[error("answer does not fit a {kind} game")]
    WrongAnswerKind { kind: GameKind },

    #[error("item {index} is already matched")]
    AlreadyMatched { index: usize },

    #[error("{definition:?} is already matched to another term")]
    DefinitionTaken { definition: String },
}

/// One answer to one game item; the variant must fit the game kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAnswer {
    /// Definition picked for a matching term.
    Definition(String),
    /// Word typed into a blank.
    Word(String),
    /// True or false pick for a statement.
    Truth(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub correct: usize,
    pub total: usize,
}

impl GameResult {
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.correct == self.total
    }
}

/// A learner's answers to one game.
///
/// Matching keeps only correct pairings and locks them, so a wrong pick can
/// simply be tried again. Blanks and true/false picks are kept as given and
/// may be changed until the learner is done.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameAttempt {
    answers: Vec<Option<GameAnswer>>,
}

impl GameAttempt {
    #[must_use]
    pub fn new(game: &Game) -> Self {
        Self {
            answers: vec![None; game.data().len()],
        }
    }

    /// Answer item `index` and report whether the answer is correct.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownItem` or `WrongAnswerKind` for answers that
    /// do not fit the game, and `AlreadyMatched` / `DefinitionTaken` when a
    /// matching pick touches a pair that is already locked.
    pub fn answer(
        &mut self,
        game: &Game,
        index: usize,
        answer: GameAnswer,
    ) -> Result<bool, GameError> {
        let correct = game.data().accepts(index, &answer)?;
        if let GameAnswer::Definition(definition) = &answer {
            if self.is_correct(game, index) == Some(true) {
                return Err(GameError::AlreadyMatched { index });
            }
            if self.answers.iter().flatten().any(|taken| taken == &answer) {
                return Err(GameError::DefinitionTaken {
                    definition: definition.clone(),
                });
            }
            if !correct {
                return Ok(false);
            }
        }
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(GameError::UnknownItem { index })?;
        *slot = Some(answer);
        Ok(correct)
    }

    #[must_use]
    pub fn answer_for(&self, index: usize) -> Option<&GameAnswer> {
        self.answers.get(index).and_then(Option::as_ref)
    }

    /// `None` while the item is unanswered.
    #[must_use]
    pub fn is_correct(&self, game: &Game, index: usize) -> Option<bool> {
        let answer = self.answer_for(index)?;
        game.data().accepts(index, answer).ok()
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn result(&self, game: &Game) -> GameResult {
        let correct = (0..self.answers.len())
            .filter(|&index| self.is_correct(game, index) == Some(true))
            .count();
        GameResult {
            correct,
            total: game.data().len(),
        }
    }

    pub fn retry(&mut self) {
        self.answers.iter_mut().for_each(|a| *a = None);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
