use serde::{Deserialize, Serialize};

use crate::error::{ContentError, require_text};
use crate::model::ids::SubTopicRef;
use crate::model::quiz::Quiz;
use crate::model::tutorial::TutorialContent;
use crate::progression::ProgressionError;

//
// ─── SYLLABUS ──────────────────────────────────────────────────────────────────
//

/// Validated syllabus outline, the seed of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllabus {
    pub title: String,
    pub modules: Vec<SyllabusModule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusModule {
    pub title: String,
    pub sub_topics: Vec<SyllabusSubTopic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusSubTopic {
    pub title: String,
    pub description: String,
}

impl Syllabus {
    /// Check the outline is non-empty and every module has sub-topics.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` for blank titles, an empty syllabus, or an
    /// empty module.
    pub fn validate(self) -> Result<Self, ContentError> {
        if self.modules.is_empty() {
            return Err(ContentError::EmptySyllabus);
        }
        let title = require_text("syllabus title", self.title)?;
        let modules = self
            .modules
            .into_iter()
            .map(|module| {
                let title = require_text("module title", module.title)?;
                if module.sub_topics.is_empty() {
                    return Err(ContentError::EmptyModule { title });
                }
                let sub_topics = module
                    .sub_topics
                    .into_iter()
                    .map(|sub_topic| {
                        Ok(SyllabusSubTopic {
                            title: require_text("sub-topic title", sub_topic.title)?,
                            description: sub_topic.description.trim().to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, ContentError>>()?;
                Ok(SyllabusModule { title, sub_topics })
            })
            .collect::<Result<Vec<_>, ContentError>>()?;
        Ok(Self { title, modules })
    }
}

//
// ─── SUB-TOPIC ─────────────────────────────────────────────────────────────────
//

/// Tutorial and quiz for one sub-topic, always stored together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTopicContent {
    pub tutorial: TutorialContent,
    pub quiz: Quiz,
}

/// Where a sub-topic sits in its `Locked -> Unlocked -> Completed` lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubTopicState {
    Locked,
    Unlocked,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubTopic {
    title: String,
    description: String,
    content: Option<SubTopicContent>,
    is_unlocked: bool,
    is_completed: bool,
}

impl SubTopic {
    fn from_outline(outline: SyllabusSubTopic) -> Self {
        Self {
            title: outline.title,
            description: outline.description,
            content: None,
            is_unlocked: false,
            is_completed: false,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn tutorial(&self) -> Option<&TutorialContent> {
        self.content.as_ref().map(|content| &content.tutorial)
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&Quiz> {
        self.content.as_ref().map(|content| &content.quiz)
    }

    #[must_use]
    pub fn content(&self) -> Option<&SubTopicContent> {
        self.content.as_ref()
    }

    #[must_use]
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.is_unlocked
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn state(&self) -> SubTopicState {
        if self.is_completed {
            SubTopicState::Completed
        } else if self.is_unlocked {
            SubTopicState::Unlocked
        } else {
            SubTopicState::Locked
        }
    }

    // Flags only ever move towards true.
    pub(crate) fn unlock(&mut self) {
        self.is_unlocked = true;
    }

    pub(crate) fn complete(&mut self) {
        self.is_unlocked = true;
        self.is_completed = true;
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    title: String,
    sub_topics: Vec<SubTopic>,
    is_completed: bool,
}

impl Module {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sub_topics(&self) -> &[SubTopic] {
        &self.sub_topics
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Set `is_completed` from the sub-topics. Returns true only on the call
    /// that flips it.
    pub(crate) fn refresh_completion(&mut self) -> bool {
        if self.is_completed || self.sub_topics.is_empty() {
            return false;
        }
        if self.sub_topics.iter().all(SubTopic::is_completed) {
            self.is_completed = true;
            return true;
        }
        false
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Completion counts across a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CourseProgress {
    pub total: usize,
    pub unlocked: usize,
    pub completed: usize,
}

/// A generated course. Values are snapshots: every transition returns a new
/// `Course` and leaves the original untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    title: String,
    modules: Vec<Module>,
}

impl Course {
    /// Seed a course from a syllabus with only the first sub-topic unlocked.
    #[must_use]
    pub fn from_syllabus(syllabus: Syllabus) -> Self {
        let modules = syllabus
            .modules
            .into_iter()
            .map(|module| Module {
                title: module.title,
                sub_topics: module
                    .sub_topics
                    .into_iter()
                    .map(SubTopic::from_outline)
                    .collect(),
                is_completed: false,
            })
            .collect();
        let mut course = Self {
            title: syllabus.title,
            modules,
        };
        if let Some(sub_topic) = course
            .first_sub_topic_from(0)
            .and_then(|first| course.sub_topic_mut(first))
        {
            sub_topic.unlock();
        }
        course
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, index: usize) -> Option<&Module> {
        self.modules.get(index)
    }

    #[must_use]
    pub fn sub_topic(&self, at: SubTopicRef) -> Option<&SubTopic> {
        self.modules
            .get(at.module())
            .and_then(|module| module.sub_topics.get(at.sub_topic()))
    }

    /// Every sub-topic position in course order.
    pub fn positions(&self) -> impl Iterator<Item = SubTopicRef> + '_ {
        self.modules.iter().enumerate().flat_map(|(m, module)| {
            (0..module.sub_topics.len()).map(move |s| SubTopicRef::new(m, s))
        })
    }

    /// The unlocked-but-incomplete sub-topic the learner should work on next.
    #[must_use]
    pub fn frontier(&self) -> Option<SubTopicRef> {
        self.positions().find(|&at| {
            self.sub_topic(at)
                .is_some_and(|s| s.state() == SubTopicState::Unlocked)
        })
    }

    /// True when every sub-topic is completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.modules
            .iter()
            .flat_map(|module| &module.sub_topics)
            .all(SubTopic::is_completed)
    }

    #[must_use]
    pub fn progress(&self) -> CourseProgress {
        let sub_topics = self.modules.iter().flat_map(|module| &module.sub_topics);
        let mut progress = CourseProgress {
            total: 0,
            unlocked: 0,
            completed: 0,
        };
        for sub_topic in sub_topics {
            progress.total += 1;
            progress.unlocked += usize::from(sub_topic.is_unlocked);
            progress.completed += usize::from(sub_topic.is_completed);
        }
        progress
    }

    /// Returns a new snapshot with `content` attached to the sub-topic at `at`.
    ///
    /// Any content already present is replaced as a whole.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::UnknownSubTopic` for an out-of-range position
    /// and `ProgressionError::Locked` for a sub-topic the learner cannot open.
    pub fn with_content(
        &self,
        at: SubTopicRef,
        content: SubTopicContent,
    ) -> Result<Self, ProgressionError> {
        self.check_openable(at)?;
        let mut next = self.clone();
        if let Some(sub_topic) = next.sub_topic_mut(at) {
            sub_topic.content = Some(content);
        }
        Ok(next)
    }

    /// Fails unless the sub-topic exists and is unlocked.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::UnknownSubTopic` or `ProgressionError::Locked`.
    pub fn check_openable(&self, at: SubTopicRef) -> Result<&SubTopic, ProgressionError> {
        let sub_topic = self
            .sub_topic(at)
            .ok_or(ProgressionError::UnknownSubTopic(at))?;
        if !sub_topic.is_unlocked() {
            return Err(ProgressionError::Locked(at));
        }
        Ok(sub_topic)
    }

    pub(crate) fn sub_topic_mut(&mut self, at: SubTopicRef) -> Option<&mut SubTopic> {
        self.modules
            .get_mut(at.module())
            .and_then(|module| module.sub_topics.get_mut(at.sub_topic()))
    }

    pub(crate) fn module_mut(&mut self, index: usize) -> Option<&mut Module> {
        self.modules.get_mut(index)
    }

    /// First sub-topic of the first non-empty module at or after `module`.
    pub(crate) fn first_sub_topic_from(&self, module: usize) -> Option<SubTopicRef> {
        self.modules
            .iter()
            .enumerate()
            .skip(module)
            .find(|(_, m)| !m.sub_topics.is_empty())
            .map(|(index, _)| SubTopicRef::new(index, 0))
    }
}
