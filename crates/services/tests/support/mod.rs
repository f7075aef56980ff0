#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, broadcast, watch};
use url::Url;

use course_core::model::{
    CoreConcept, Game, GameData, MatchingPair, Quiz, QuizAttempt, QuizMistake, QuizQuestion,
    Syllabus, SyllabusModule, SyllabusSubTopic, TutorialContent,
};
use services::{ContentProvider, CourseEvent, CourseSession, ProviderError};

/// Holds requests in flight until the test releases them.
pub struct Gate {
    held: AtomicBool,
    released: Semaphore,
    arrived: watch::Sender<usize>,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            held: AtomicBool::new(false),
            released: Semaphore::new(0),
            arrived: watch::channel(0).0,
        }
    }
}

impl Gate {
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let every held and future request through.
    pub fn release(&self) {
        self.released.close();
    }

    /// Wait until `count` requests have reached the gate.
    pub async fn arrivals(&self, count: usize) {
        let mut arrived = self.arrived.subscribe();
        tokio::time::timeout(Duration::from_secs(5), arrived.wait_for(|&n| n >= count))
            .await
            .expect("requests reached the gate")
            .expect("gate alive");
    }

    async fn pass(&self) {
        if self.held.load(Ordering::SeqCst) {
            self.arrived.send_modify(|n| *n += 1);
            // Closing the semaphore wakes every waiter with an error.
            let _ = self.released.acquire().await;
        }
    }
}

/// Scripted provider: fixed syllabus shape, deterministic content, switchable
/// failures, gates and per-request call counters.
#[derive(Default)]
pub struct FakeProvider {
    pub module_sizes: Vec<usize>,
    pub syllabus_calls: AtomicUsize,
    pub tutorial_calls: AtomicUsize,
    pub quiz_calls: AtomicUsize,
    pub game_calls: AtomicUsize,
    pub advice_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub fail_syllabus: AtomicBool,
    pub fail_tutorial: AtomicBool,
    pub fail_quiz: AtomicBool,
    pub fail_game: AtomicBool,
    pub fail_advice: AtomicBool,
    pub tutorial_gate: Gate,
    pub game_gate: Gate,
}

impl FakeProvider {
    pub fn new(module_sizes: &[usize]) -> Arc<Self> {
        Arc::new(Self {
            module_sizes: module_sizes.to_vec(),
            ..Self::default()
        })
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), ProviderError> {
        if flag.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable(format!("{what} is down")));
        }
        Ok(())
    }
}

pub fn right(n: usize) -> String {
    format!("right {n}")
}

pub fn wrong(n: usize) -> String {
    format!("wrong {n}")
}

/// Question `n` of the quiz from the `load`-th quiz request.
fn question(n: usize, load: usize) -> QuizQuestion {
    QuizQuestion::new(
        format!("Question {n} of load {load}?"),
        vec![wrong(n), right(n), format!("other {n}"), format!("none {n}")],
        right(n),
    )
    .unwrap()
}

#[async_trait]
impl ContentProvider for FakeProvider {
    async fn generate_syllabus(&self, topic: &str) -> Result<Syllabus, ProviderError> {
        self.syllabus_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_syllabus, "syllabus")?;
        Ok(Syllabus {
            title: format!("Learning {topic}"),
            modules: self
                .module_sizes
                .iter()
                .enumerate()
                .map(|(m, &size)| SyllabusModule {
                    title: format!("Module {m}"),
                    sub_topics: (0..size)
                        .map(|s| SyllabusSubTopic {
                            title: format!("Topic {m}.{s}"),
                            description: format!("About topic {m}.{s}."),
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    async fn generate_tutorial(
        &self,
        sub_topic_title: &str,
        _description: &str,
    ) -> Result<TutorialContent, ProviderError> {
        let load = self.tutorial_calls.fetch_add(1, Ordering::SeqCst);
        self.tutorial_gate.pass().await;
        Self::check(&self.fail_tutorial, "tutorial")?;
        let concepts = vec![
            CoreConcept::new(sub_topic_title, "Explained.", None)?,
            CoreConcept::new("Details", "Explained further.", None)?,
        ];
        Ok(TutorialContent::new(
            format!("Welcome to {sub_topic_title}."),
            concepts,
            format!("Remember load {load}."),
            question(0, load),
        )?)
    }

    async fn generate_quiz(&self, _sub_topic_title: &str) -> Result<Quiz, ProviderError> {
        let load = self.quiz_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_quiz, "quiz")?;
        Ok(Quiz::new((0..10).map(|n| question(n, load)).collect())?)
    }

    async fn generate_game(&self, module_title: &str) -> Result<Game, ProviderError> {
        self.game_calls.fetch_add(1, Ordering::SeqCst);
        self.game_gate.pass().await;
        Self::check(&self.fail_game, "game")?;
        let pairs = (0..5)
            .map(|i| MatchingPair {
                term: format!("term {i}"),
                definition: format!("definition {i}"),
            })
            .collect();
        Ok(Game::new(
            module_title,
            format!("{module_title} match-up"),
            "Match each term.",
            GameData::Matching(pairs),
        )?)
    }

    async fn generate_quiz_advice(
        &self,
        _sub_topic_title: &str,
        mistakes: &[QuizMistake],
    ) -> Result<String, ProviderError> {
        self.advice_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_advice, "advice")?;
        Ok(format!("Review {} questions.", mistakes.len()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<Url, ProviderError> {
        let n = self.image_calls.fetch_add(1, Ordering::SeqCst);
        Url::parse(&format!("https://img.example.com/{n}.png?p={}", prompt.len()))
            .map_err(|err| ProviderError::Malformed(err.to_string()))
    }
}

pub fn session(provider: &Arc<FakeProvider>) -> CourseSession {
    CourseSession::new(provider.clone())
}

/// Fill an attempt with `correct` right answers followed by wrong ones.
pub fn answer(quiz: &Quiz, correct: usize) -> QuizAttempt {
    let mut attempt = QuizAttempt::new(quiz);
    for n in 0..quiz.len() {
        let option = if n < correct { right(n) } else { wrong(n) };
        attempt.select(quiz, n, &option).unwrap();
    }
    attempt
}

pub async fn next_event(events: &mut broadcast::Receiver<CourseEvent>) -> CourseEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event within timeout")
        .expect("event channel open")
}
