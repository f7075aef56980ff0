//! Plain-text rendering of course state for the terminal.

use course_core::model::{
    Course, Game, GameCollection, GameResult, QuizQuestion, QuizResult, SubTopicRef,
    SubTopicState, TutorialContent,
};
use services::ProgressUpdate;

pub fn outline(course: &Course) {
    let progress = course.progress();
    println!();
    println!(
        "{}  ({}/{} completed)",
        course.title(),
        progress.completed,
        progress.total
    );
    for (m, module) in course.modules().iter().enumerate() {
        let done = if module.is_completed() { "  [done]" } else { "" };
        println!("  Module {}: {}{done}", m + 1, module.title());
        for (s, sub_topic) in module.sub_topics().iter().enumerate() {
            let marker = match sub_topic.state() {
                SubTopicState::Completed => "x",
                SubTopicState::Unlocked => ">",
                SubTopicState::Locked => " ",
            };
            println!(
                "    [{marker}] {}  {}",
                SubTopicRef::new(m, s),
                sub_topic.title()
            );
        }
    }
}

pub fn tutorial(title: &str, tutorial: &TutorialContent) {
    println!();
    println!("=== {title} ===");
    println!();
    println!("{}", tutorial.introduction());
    if let Some(url) = tutorial.intro_image_url() {
        println!("(image: {url})");
    }
    for concept in tutorial.core_concepts() {
        println!();
        println!("## {}", concept.title());
        println!("{}", concept.explanation());
        if let Some(url) = concept.image_url() {
            println!("(image: {url})");
        }
    }
    println!();
    println!("Key takeaway: {}", tutorial.key_takeaway());
}

pub fn question(number: usize, question: &QuizQuestion) {
    println!();
    println!("{number}. {}", question.question());
    for (i, option) in question.options().iter().enumerate() {
        println!("   {}) {option}", i + 1);
    }
}

pub fn result(result: &QuizResult) {
    let verdict = if result.passed() { "passed" } else { "not passed yet" };
    println!();
    println!("Score: {}/{} ({verdict})", result.score, result.total);
}

pub fn progress(update: &ProgressUpdate) {
    if let Some(module) = &update.completed_module {
        println!("Module \"{module}\" complete. A review game is being prepared.");
    }
    match update.unlocked.and_then(|at| Some((at, update.course.sub_topic(at)?))) {
        Some((at, next)) => println!("Unlocked {at}: {}", next.title()),
        None => println!("That was the last sub-topic."),
    }
}

pub fn games(games: &GameCollection) {
    if games.is_empty() {
        println!("No games yet. Finish a module to earn one.");
        return;
    }
    println!();
    for (i, game) in games.iter().enumerate() {
        println!(
            "  {}) {} [{}] from \"{}\"",
            i + 1,
            game.title(),
            game.kind(),
            game.module_title()
        );
    }
}

pub fn game(game: &Game) {
    println!();
    println!("=== {} ===", game.title());
    println!("{}", game.instructions());
}

/// Numbered list of the definitions to match against.
pub fn definitions(definitions: &[&str]) {
    println!();
    for (i, definition) in definitions.iter().enumerate() {
        println!("   {}) {definition}", i + 1);
    }
    println!();
}

pub fn game_result(result: &GameResult) {
    println!();
    println!("Game score: {}/{}", result.correct, result.total);
}
