mod support;

use std::time::Duration;

use course_core::ProgressionError;
use course_core::model::{SubTopicRef, SubTopicState};
use services::{CourseEvent, CourseSession, SessionError};

use support::{FakeProvider, next_event, session};

fn at(module: usize, sub_topic: usize) -> SubTopicRef {
    SubTopicRef::new(module, sub_topic)
}

#[tokio::test]
async fn start_unlocks_only_the_first_sub_topic() {
    let provider = FakeProvider::new(&[2, 3]);
    let session = session(&provider);

    let course = session.start("Rust").await.unwrap();
    assert_eq!(course.title(), "Learning Rust");
    assert_eq!(course.frontier(), Some(at(0, 0)));
    let unlocked: Vec<_> = course
        .positions()
        .filter(|&pos| course.sub_topic(pos).unwrap().is_unlocked())
        .collect();
    assert_eq!(unlocked, vec![at(0, 0)]);
    assert_eq!(course.progress().completed, 0);
    assert!(session.games().is_empty());
}

#[tokio::test]
async fn blank_topic_is_rejected_without_a_request() {
    let provider = FakeProvider::new(&[1]);
    let session = session(&provider);

    let err = session.start("   ").await.unwrap_err();
    assert!(matches!(err, SessionError::EmptyTopic));
    assert_eq!(FakeProvider::calls(&provider.syllabus_calls), 0);
}

#[tokio::test]
async fn syllabus_failure_leaves_no_course() {
    let provider = FakeProvider::new(&[1]);
    let session = session(&provider);
    session.start("Rust").await.unwrap();

    FakeProvider::set(&provider.fail_syllabus, true);
    let err = session.start("Go").await.unwrap_err();
    assert!(matches!(err, SessionError::Syllabus(ref source) if source.is_unavailable()));
    assert!(session.course().is_none());
    assert!(matches!(
        session.open_sub_topic(at(0, 0)).await.unwrap_err(),
        SessionError::NoCourse
    ));
}

#[tokio::test]
async fn opening_twice_requests_content_once() {
    let provider = FakeProvider::new(&[2]);
    let session = session(&provider);
    session.start("Rust").await.unwrap();

    let first = session.open_sub_topic(at(0, 0)).await.unwrap();
    let second = session.open_sub_topic(at(0, 0)).await.unwrap();

    assert_eq!(FakeProvider::calls(&provider.tutorial_calls), 1);
    assert_eq!(FakeProvider::calls(&provider.quiz_calls), 1);
    assert_eq!(FakeProvider::calls(&provider.image_calls), 0);
    assert_eq!(
        first.sub_topic(at(0, 0)).unwrap().content(),
        second.sub_topic(at(0, 0)).unwrap().content()
    );
    assert_eq!(second.sub_topic(at(0, 0)).unwrap().quiz().unwrap().len(), 10);
}

#[tokio::test]
async fn partial_content_failure_writes_nothing() {
    let provider = FakeProvider::new(&[2]);
    let session = session(&provider);
    session.start("Rust").await.unwrap();

    FakeProvider::set(&provider.fail_quiz, true);
    let err = session.open_sub_topic(at(0, 0)).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::ContentLoadFailed { at: failed, .. } if failed == at(0, 0)
    ));
    let course = session.course().unwrap();
    let sub_topic = course.sub_topic(at(0, 0)).unwrap();
    assert!(sub_topic.tutorial().is_none());
    assert!(sub_topic.quiz().is_none());

    FakeProvider::set(&provider.fail_quiz, false);
    let course = session.open_sub_topic(at(0, 0)).await.unwrap();
    assert!(course.sub_topic(at(0, 0)).unwrap().has_content());
}

#[tokio::test]
async fn locked_sub_topics_cannot_be_opened_or_passed() {
    let provider = FakeProvider::new(&[2]);
    let session = session(&provider);
    let before = session.start("Rust").await.unwrap();

    let err = session.open_sub_topic(at(0, 1)).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Progression(ProgressionError::Locked(_))
    ));
    let err = session.record_quiz_pass(at(0, 1)).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Progression(ProgressionError::Locked(_))
    ));
    let err = session.record_quiz_pass(at(5, 0)).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Progression(ProgressionError::UnknownSubTopic(_))
    ));

    assert_eq!(*session.course().unwrap(), *before);
    assert_eq!(FakeProvider::calls(&provider.tutorial_calls), 0);
}

#[tokio::test]
async fn passes_unlock_linearly_within_a_module() {
    let provider = FakeProvider::new(&[3]);
    let session = session(&provider);
    session.start("Rust").await.unwrap();

    let update = session.record_quiz_pass(at(0, 0)).await.unwrap();
    assert_eq!(update.completed, at(0, 0));
    assert_eq!(update.unlocked, Some(at(0, 1)));
    assert!(update.completed_module.is_none());

    let course = session.course().unwrap();
    assert_eq!(
        course.sub_topic(at(0, 0)).unwrap().state(),
        SubTopicState::Completed
    );
    assert_eq!(
        course.sub_topic(at(0, 1)).unwrap().state(),
        SubTopicState::Unlocked
    );
    assert_eq!(
        course.sub_topic(at(0, 2)).unwrap().state(),
        SubTopicState::Locked
    );

    let err = session.record_quiz_pass(at(0, 0)).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Progression(ProgressionError::AlreadyCompleted(_))
    ));
}

#[tokio::test]
async fn finishing_a_module_produces_one_game() {
    let provider = FakeProvider::new(&[2, 1]);
    let session = session(&provider);
    let mut events = session.subscribe();
    session.start("Rust").await.unwrap();

    session.record_quiz_pass(at(0, 0)).await.unwrap();
    let update = session.record_quiz_pass(at(0, 1)).await.unwrap();
    assert_eq!(update.completed_module.as_deref(), Some("Module 0"));
    assert_eq!(update.unlocked, Some(at(1, 0)));
    assert!(update.course.module(0).unwrap().is_completed());
    assert!(!update.course.module(1).unwrap().is_completed());

    assert_eq!(
        next_event(&mut events).await,
        CourseEvent::GameReady {
            module_title: "Module 0".into()
        }
    );
    let games = session.games();
    assert_eq!(games.len(), 1);
    assert_eq!(games.games()[0].module_title(), "Module 0");
    assert_eq!(FakeProvider::calls(&provider.game_calls), 1);
}

#[tokio::test]
async fn game_failure_does_not_undo_progress() {
    let provider = FakeProvider::new(&[1, 1]);
    let session = session(&provider);
    let mut events = session.subscribe();
    session.start("Rust").await.unwrap();

    FakeProvider::set(&provider.fail_game, true);
    let update = session.record_quiz_pass(at(0, 0)).await.unwrap();

    match next_event(&mut events).await {
        CourseEvent::GameFailed {
            module_title,
            error,
        } => {
            assert_eq!(module_title, "Module 0");
            assert!(error.contains("game is down"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(session.games().is_empty());
    let course = session.course().unwrap();
    assert_eq!(*course, *update.course);
    assert!(course.module(0).unwrap().is_completed());
    assert_eq!(course.frontier(), Some(at(1, 0)));
}

#[tokio::test]
async fn walking_the_whole_course_finishes_it() {
    let provider = FakeProvider::new(&[2, 0, 1]);
    let session = session(&provider);
    let mut events = session.subscribe();
    session.start("Rust").await.unwrap();

    session.record_quiz_pass(at(0, 0)).await.unwrap();
    let update = session.record_quiz_pass(at(0, 1)).await.unwrap();
    assert_eq!(update.unlocked, Some(at(2, 0)));
    next_event(&mut events).await;

    let update = session.record_quiz_pass(at(2, 0)).await.unwrap();
    assert_eq!(update.unlocked, None);
    assert_eq!(update.completed_module.as_deref(), Some("Module 2"));
    next_event(&mut events).await;

    let course = session.course().unwrap();
    assert!(course.is_finished());
    assert_eq!(course.frontier(), None);
    let titles: Vec<_> = session
        .games()
        .iter()
        .map(|game| game.module_title().to_string())
        .collect();
    assert_eq!(titles, vec!["Module 0", "Module 2"]);
}

#[tokio::test]
async fn restarting_clears_games_and_progress() {
    let provider = FakeProvider::new(&[1, 1]);
    let session = session(&provider);
    let mut events = session.subscribe();
    session.start("Rust").await.unwrap();
    session.record_quiz_pass(at(0, 0)).await.unwrap();
    next_event(&mut events).await;
    assert_eq!(session.games().len(), 1);

    let course = session.start("Go").await.unwrap();
    assert_eq!(course.title(), "Learning Go");
    assert_eq!(course.frontier(), Some(at(0, 0)));
    assert!(session.games().is_empty());
}

#[tokio::test]
async fn images_are_added_when_enabled() {
    let provider = FakeProvider::new(&[1]);
    let session = CourseSession::new(provider.clone()).with_images(true);
    session.start("Rust").await.unwrap();

    let course = session.open_sub_topic(at(0, 0)).await.unwrap();

    let tutorial = course.sub_topic(at(0, 0)).unwrap().tutorial().unwrap();
    assert!(tutorial.intro_image_url().is_some());
    assert_eq!(tutorial.core_concepts().len(), 2);
    assert!(tutorial.core_concepts().iter().all(|c| c.image_url().is_some()));
    assert_eq!(FakeProvider::calls(&provider.image_calls), 3);
}

#[tokio::test]
async fn restart_during_open_discards_the_content() {
    let provider = FakeProvider::new(&[1]);
    let session = session(&provider);
    session.start("Rust").await.unwrap();

    provider.tutorial_gate.hold();
    let opening = tokio::spawn({
        let session = session.clone();
        async move { session.open_sub_topic(at(0, 0)).await }
    });
    provider.tutorial_gate.arrivals(1).await;
    session.start("Go").await.unwrap();
    provider.tutorial_gate.release();

    let err = opening.await.unwrap().unwrap_err();
    assert!(matches!(err, SessionError::Superseded));
    let course = session.course().unwrap();
    assert_eq!(course.title(), "Learning Go");
    assert!(!course.sub_topic(at(0, 0)).unwrap().has_content());
}

#[tokio::test]
async fn concurrent_opens_keep_one_whole_pair() {
    let provider = FakeProvider::new(&[2]);
    let session = session(&provider);
    session.start("Rust").await.unwrap();

    provider.tutorial_gate.hold();
    let release = async {
        provider.tutorial_gate.arrivals(2).await;
        provider.tutorial_gate.release();
    };
    let (first, second, ()) = tokio::join!(
        session.open_sub_topic(at(0, 0)),
        session.open_sub_topic(at(0, 0)),
        release,
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(FakeProvider::calls(&provider.tutorial_calls), 2);
    assert_eq!(FakeProvider::calls(&provider.quiz_calls), 2);
    let course = session.course().unwrap();
    let sub_topic = course.sub_topic(at(0, 0)).unwrap();
    let takeaway = sub_topic.tutorial().unwrap().key_takeaway();
    let load = takeaway
        .strip_prefix("Remember load ")
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap();
    let quiz = sub_topic.quiz().unwrap();
    assert_eq!(quiz.len(), 10);
    assert!(
        quiz.questions()
            .iter()
            .all(|q| q.question().ends_with(&format!("of load {load}?")))
    );
    assert!(!course.sub_topic(at(0, 1)).unwrap().has_content());
}

#[tokio::test]
async fn game_for_a_replaced_course_is_dropped() {
    let provider = FakeProvider::new(&[1, 1]);
    let session = session(&provider);
    let mut events = session.subscribe();
    session.start("Rust").await.unwrap();

    provider.game_gate.hold();
    let update = session.record_quiz_pass(at(0, 0)).await.unwrap();
    assert_eq!(update.completed_module.as_deref(), Some("Module 0"));
    provider.game_gate.arrivals(1).await;
    session.start("Go").await.unwrap();
    provider.game_gate.release();

    let quiet = tokio::time::timeout(Duration::from_millis(200), events.recv()).await;
    assert!(quiet.is_err(), "unexpected event {quiet:?}");
    assert!(session.games().is_empty());
    assert_eq!(FakeProvider::calls(&provider.game_calls), 1);
}

#[tokio::test]
async fn game_failure_for_a_replaced_course_is_silent() {
    let provider = FakeProvider::new(&[1, 1]);
    let session = session(&provider);
    let mut events = session.subscribe();
    session.start("Rust").await.unwrap();

    FakeProvider::set(&provider.fail_game, true);
    provider.game_gate.hold();
    session.record_quiz_pass(at(0, 0)).await.unwrap();
    provider.game_gate.arrivals(1).await;
    session.start("Go").await.unwrap();
    provider.game_gate.release();

    let quiet = tokio::time::timeout(Duration::from_millis(200), events.recv()).await;
    assert!(quiet.is_err(), "unexpected event {quiet:?}");

    FakeProvider::set(&provider.fail_game, false);
    session.record_quiz_pass(at(0, 0)).await.unwrap();
    assert_eq!(
        next_event(&mut events).await,
        CourseEvent::GameReady {
            module_title: "Module 0".into()
        }
    );
    assert_eq!(session.games().len(), 1);
}
