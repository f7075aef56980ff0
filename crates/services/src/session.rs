use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use course_core::model::{
    Course, GameCollection, Quiz, QuizAttempt, QuizResult, SubTopic, SubTopicRef,
};
use course_core::ProgressionError;

use crate::advice::QuizAdvisor;
use crate::content_loader::ContentLoader;
use crate::error::SessionError;
use crate::provider::ContentProvider;

const EVENT_CAPACITY: usize = 16;

/// Background outcomes that happen after an operation has returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseEvent {
    GameReady { module_title: String },
    GameFailed { module_title: String, error: String },
}

/// What a quiz pass changed.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub course: Arc<Course>,
    pub completed: SubTopicRef,
    pub unlocked: Option<SubTopicRef>,
    /// Set when this pass finished a module; a game is being generated for it.
    pub completed_module: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuizSubmission {
    pub result: QuizResult,
    /// `None` when the quiz was failed or the sub-topic was already completed.
    pub progress: Option<ProgressUpdate>,
}

#[derive(Default)]
struct SessionState {
    /// Bumped on every `start`; work begun under an older value is discarded.
    generation: u64,
    course: Option<Arc<Course>>,
    games: GameCollection,
}

/// Owns the current course and drives it through the provider.
///
/// Readers get `Arc<Course>` snapshots; every change swaps in a new snapshot
/// under the write lock, which is never held across an `.await`.
#[derive(Clone)]
pub struct CourseSession {
    provider: Arc<dyn ContentProvider>,
    loader: ContentLoader,
    advisor: QuizAdvisor,
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<CourseEvent>,
}

impl CourseSession {
    #[must_use]
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            loader: ContentLoader::new(Arc::clone(&provider)),
            advisor: QuizAdvisor::new(Arc::clone(&provider)),
            provider,
            state: Arc::new(RwLock::new(SessionState::default())),
            events,
        }
    }

    /// Illustrate tutorials as they are loaded.
    #[must_use]
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.loader = self.loader.with_images(enabled);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn course(&self) -> Option<Arc<Course>> {
        self.read().course.clone()
    }

    #[must_use]
    pub fn games(&self) -> GameCollection {
        self.read().games.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CourseEvent> {
        self.events.subscribe()
    }

    fn snapshot(&self) -> Result<(u64, Arc<Course>), SessionError> {
        let state = self.read();
        let course = state.course.clone().ok_or(SessionError::NoCourse)?;
        Ok((state.generation, course))
    }

    //
    // ─── COURSE LIFECYCLE ──────────────────────────────────────────────────────
    //

    /// Replace the current course with a fresh one for `topic`.
    ///
    /// The previous course and its games are dropped before the request is
    /// made, so a failure leaves the session empty.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTopic`, `SessionError::Syllabus` when the
    /// provider fails, or `SessionError::Superseded` if another `start` won.
    pub async fn start(&self, topic: &str) -> Result<Arc<Course>, SessionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }

        let generation = {
            let mut state = self.write();
            state.generation += 1;
            state.course = None;
            state.games = GameCollection::new();
            state.generation
        };

        tracing::info!(topic, "generating syllabus");
        let syllabus = self
            .provider
            .generate_syllabus(topic)
            .await
            .map_err(SessionError::Syllabus)?;
        let course = Arc::new(Course::from_syllabus(syllabus));

        let mut state = self.write();
        if state.generation != generation {
            return Err(SessionError::Superseded);
        }
        state.course = Some(Arc::clone(&course));
        tracing::info!(
            title = course.title(),
            modules = course.modules().len(),
            "course ready"
        );
        Ok(course)
    }

    /// Make sure the sub-topic's tutorial and quiz are loaded.
    ///
    /// Already-loaded sub-topics return the current snapshot without any
    /// provider request.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Progression` for unknown or locked sub-topics and
    /// `SessionError::ContentLoadFailed` when generation fails; in that case
    /// the course is unchanged and the call may be retried.
    pub async fn open_sub_topic(&self, at: SubTopicRef) -> Result<Arc<Course>, SessionError> {
        let (generation, course) = self.snapshot()?;
        let sub_topic = course.check_openable(at)?;
        if sub_topic.has_content() {
            return Ok(course);
        }

        let content = self
            .loader
            .ensure_content(sub_topic)
            .await
            .map_err(|source| {
                tracing::warn!(%at, error = %source, "content load failed");
                SessionError::ContentLoadFailed { at, source }
            })?;

        let mut state = self.write();
        if state.generation != generation {
            return Err(SessionError::Superseded);
        }
        let latest = state.course.clone().ok_or(SessionError::NoCourse)?;
        let next = Arc::new(latest.with_content(at, content)?);
        state.course = Some(Arc::clone(&next));
        Ok(next)
    }

    //
    // ─── PROGRESSION ───────────────────────────────────────────────────────────
    //

    /// Complete a sub-topic and unlock the next one.
    ///
    /// When this finishes a module, a game for it is requested in the
    /// background; watch [`CourseSession::subscribe`] for the outcome.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Progression` for unknown, locked or already
    /// completed sub-topics.
    pub async fn record_quiz_pass(&self, at: SubTopicRef) -> Result<ProgressUpdate, SessionError> {
        let (generation, update) = {
            let mut state = self.write();
            let course = state.course.clone().ok_or(SessionError::NoCourse)?;
            let pass = course.record_quiz_pass(at)?;
            let completed_module = pass.completed_module_title().map(str::to_string);
            let next = Arc::new(pass.course);
            state.course = Some(Arc::clone(&next));
            let update = ProgressUpdate {
                course: next,
                completed: pass.completed,
                unlocked: pass.unlocked,
                completed_module,
            };
            (state.generation, update)
        };

        tracing::info!(completed = %at, unlocked = ?update.unlocked, "quiz passed");
        if let Some(module_title) = &update.completed_module {
            tracing::info!(module = %module_title, "module completed");
            self.spawn_game(generation, module_title.clone());
        }
        Ok(update)
    }

    fn spawn_game(&self, generation: u64, module_title: String) {
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = provider.generate_game(&module_title).await;
            let mut state = state.write().unwrap_or_else(PoisonError::into_inner);
            if state.generation != generation {
                tracing::debug!(module = %module_title, "dropping game for replaced course");
                return;
            }
            let event = match outcome {
                Ok(game) => {
                    state.games.append(game);
                    tracing::info!(module = %module_title, games = state.games.len(), "game ready");
                    CourseEvent::GameReady { module_title }
                }
                Err(err) => {
                    tracing::warn!(module = %module_title, error = %err, "game generation failed");
                    CourseEvent::GameFailed {
                        module_title,
                        error: err.to_string(),
                    }
                }
            };
            drop(state);
            // No subscribers is fine.
            let _ = events.send(event);
        });
    }

    //
    // ─── QUIZ ──────────────────────────────────────────────────────────────────
    //

    /// Score `attempt` against the sub-topic's quiz and record a pass.
    ///
    /// A failing score returns the result without touching the course. A
    /// passing retake of a completed sub-topic is scored but not recorded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizNotLoaded` before the sub-topic is opened,
    /// `SessionError::Quiz` for incomplete or repeated submissions, and the
    /// errors of [`CourseSession::record_quiz_pass`].
    pub async fn submit_quiz(
        &self,
        at: SubTopicRef,
        attempt: &mut QuizAttempt,
    ) -> Result<QuizSubmission, SessionError> {
        let (_, course) = self.snapshot()?;
        let sub_topic = course.check_openable(at)?;
        let quiz = loaded_quiz(sub_topic, at)?;
        let result = attempt.submit(quiz)?;

        if !result.passed() {
            tracing::info!(%at, score = result.score, "quiz failed");
            return Ok(QuizSubmission {
                result,
                progress: None,
            });
        }
        let progress = match self.record_quiz_pass(at).await {
            Ok(update) => Some(update),
            Err(SessionError::Progression(ProgressionError::AlreadyCompleted(_))) => None,
            Err(err) => return Err(err),
        };
        Ok(QuizSubmission { result, progress })
    }

    /// Study advice for the mistakes in a submitted attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizNotLoaded` or `SessionError::Quiz` when the
    /// attempt has not been submitted. Provider failures degrade to a canned
    /// message instead of an error.
    pub async fn quiz_advice(
        &self,
        at: SubTopicRef,
        attempt: &QuizAttempt,
    ) -> Result<String, SessionError> {
        let (_, course) = self.snapshot()?;
        let sub_topic = course
            .sub_topic(at)
            .ok_or(ProgressionError::UnknownSubTopic(at))?;
        let quiz = loaded_quiz(sub_topic, at)?;
        attempt.result(quiz)?;
        let mistakes = attempt.mistakes(quiz);
        Ok(self.advisor.advise(sub_topic.title(), &mistakes).await)
    }
}

fn loaded_quiz(sub_topic: &SubTopic, at: SubTopicRef) -> Result<&Quiz, SessionError> {
    sub_topic.quiz().ok_or(SessionError::QuizNotLoaded(at))
}
