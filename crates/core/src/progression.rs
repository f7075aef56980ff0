use thiserror::Error;

use crate::model::{
    Course, Module, PASS_THRESHOLD, QuizResult, SubTopic, SubTopicRef, SubTopicState,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A progression call that does not fit the sub-topic's current state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressionError {
    #[error("sub-topic {0} does not exist")]
    UnknownSubTopic(SubTopicRef),

    #[error("sub-topic {0} is locked")]
    Locked(SubTopicRef),

    #[error("sub-topic {0} is already completed")]
    AlreadyCompleted(SubTopicRef),

    #[error("score {score} is below the pass mark of {required}")]
    BelowThreshold { score: usize, required: usize },
}

//
// ─── TRANSITION ────────────────────────────────────────────────────────────────
//

/// Result of a successful quiz pass: the next course snapshot plus what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPass {
    pub course: Course,
    pub completed: SubTopicRef,
    /// Sub-topic unlocked by this pass, `None` when the course is finished.
    pub unlocked: Option<SubTopicRef>,
    /// Index of the module this pass completed, if any.
    pub completed_module: Option<usize>,
}

impl QuizPass {
    /// Title of the module completed by this pass.
    #[must_use]
    pub fn completed_module_title(&self) -> Option<&str> {
        self.completed_module
            .and_then(|index| self.course.module(index))
            .map(Module::title)
    }
}

impl Course {
    /// Complete the sub-topic at `at` and advance the frontier.
    ///
    /// Unlocks the next sub-topic in the same module, or the first sub-topic
    /// of the next non-empty module when `at` was the last one. The owning
    /// module is marked completed once all of its sub-topics are.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::UnknownSubTopic`, `Locked` or
    /// `AlreadyCompleted`; `self` is never modified.
    pub fn record_quiz_pass(&self, at: SubTopicRef) -> Result<QuizPass, ProgressionError> {
        match self
            .sub_topic(at)
            .map(SubTopic::state)
            .ok_or(ProgressionError::UnknownSubTopic(at))?
        {
            SubTopicState::Locked => return Err(ProgressionError::Locked(at)),
            SubTopicState::Completed => return Err(ProgressionError::AlreadyCompleted(at)),
            SubTopicState::Unlocked => {}
        }

        let mut next = self.clone();
        if let Some(sub_topic) = next.sub_topic_mut(at) {
            sub_topic.complete();
        }

        let unlocked = next.successor(at);
        if let Some(sub_topic) = unlocked.and_then(|u| next.sub_topic_mut(u)) {
            sub_topic.unlock();
        }

        let completed_module = next
            .module_mut(at.module())
            .is_some_and(Module::refresh_completion)
            .then_some(at.module());

        Ok(QuizPass {
            course: next,
            completed: at,
            unlocked,
            completed_module,
        })
    }

    /// Like `record_quiz_pass`, but only for a result that meets the pass mark.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::BelowThreshold` for a failing result, plus
    /// every error of `record_quiz_pass`.
    pub fn record_quiz_result(
        &self,
        at: SubTopicRef,
        result: &QuizResult,
    ) -> Result<QuizPass, ProgressionError> {
        if !result.passed() {
            return Err(ProgressionError::BelowThreshold {
                score: result.score,
                required: PASS_THRESHOLD,
            });
        }
        self.record_quiz_pass(at)
    }

    fn successor(&self, at: SubTopicRef) -> Option<SubTopicRef> {
        let module = self.module(at.module())?;
        if at.sub_topic() + 1 < module.sub_topics().len() {
            return Some(SubTopicRef::new(at.module(), at.sub_topic() + 1));
        }
        self.first_sub_topic_from(at.module() + 1)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
