mod render;

use std::fmt;
use std::io::{self, StdinLock, Write};
use std::sync::Arc;
use std::time::Duration;

use course_core::model::{
    FillInTheBlank, Game, GameAnswer, GameAttempt, GameCollection, GameData, GameError,
    MatchingPair, QuizAttempt, QuizQuestion, SubTopicRef, TrueFalseStatement,
};
use services::{ChatCompletionsProvider, CourseEvent, CourseSession, ProviderConfig, SessionError};
use tokio::sync::broadcast::{self, error::RecvError};

const GAME_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    EmptyTopic,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::EmptyTopic => write!(f, "--topic cannot be empty"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- learn    [--topic <text>] [--images | --no-images] [-v]");
    eprintln!("  cargo run -p app -- syllabus  --topic <text> [-v]");
    eprintln!();
    eprintln!("Environment (a .env file is read if present):");
    eprintln!("  COURSE_AI_API_KEY (required), COURSE_AI_BASE_URL, COURSE_AI_MODEL,");
    eprintln!("  COURSE_AI_TUTORIAL_MODEL, COURSE_AI_IMAGE_MODEL, COURSE_AI_IMAGES,");
    eprintln!("  COURSE_AI_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Learn,
    Syllabus,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "learn" => Some(Self::Learn),
            "syllabus" => Some(Self::Syllabus),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    topic: Option<String>,
    images: Option<bool>,
    verbose: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--topic" => {
                    let value = require_value(args, "--topic")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::EmptyTopic);
                    }
                    parsed.topic = Some(value);
                }
                "--images" => parsed.images = Some(true),
                "--no-images" => parsed.images = Some(false),
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    // Logs go to stderr so they do not interleave with prompts on stdout.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

//
// ─── TERMINAL INPUT ────────────────────────────────────────────────────────────
//

struct Terminal {
    lines: io::Lines<StdinLock<'static>>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: io::stdin().lines(),
        }
    }

    /// `None` once stdin is closed.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        print!("{label} ");
        io::stdout().flush()?;
        self.lines
            .next()
            .transpose()
            .map(|line| line.map(|line| line.trim().to_string()))
    }

    fn confirm(&mut self, label: &str, default: bool) -> io::Result<bool> {
        Ok(match self.prompt(label)?.as_deref() {
            None => false,
            Some("") => default,
            Some(answer) => {
                answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
            }
        })
    }

    /// Ask until the learner picks a number in `1..=count`; returns it 0-based.
    fn pick(&mut self, label: &str, count: usize) -> io::Result<Option<usize>> {
        loop {
            let Some(raw) = self.prompt(label)? else {
                return Ok(None);
            };
            match parse_choice(&raw, count) {
                Some(index) => return Ok(Some(index)),
                None => println!("Pick a number between 1 and {count}."),
            }
        }
    }

    /// Ask until the learner picks one of the question's options.
    fn choose(&mut self, question: &QuizQuestion) -> io::Result<Option<String>> {
        let options = question.options();
        let picked = self.pick(&format!("Answer [1-{}]:", options.len()), options.len())?;
        Ok(picked.map(|index| options[index].clone()))
    }

    fn truth(&mut self, label: &str) -> io::Result<Option<bool>> {
        loop {
            let Some(raw) = self.prompt(label)? else {
                return Ok(None);
            };
            match parse_truth(&raw) {
                Some(pick) => return Ok(Some(pick)),
                None => println!("Answer t or f."),
            }
        }
    }
}

/// 1-based menu choice to a 0-based index.
fn parse_choice(raw: &str, count: usize) -> Option<usize> {
    let n = raw.trim().parse::<usize>().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

fn parse_truth(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "t" | "true" => Some(true),
        "f" | "false" => Some(false),
        _ => None,
    }
}

/// Accepts the 1-based `module.sub_topic` form printed in the outline.
fn parse_position(raw: &str) -> Option<SubTopicRef> {
    let (module, sub_topic) = raw.split_once('.')?;
    let module = module.trim().parse::<usize>().ok()?.checked_sub(1)?;
    let sub_topic = sub_topic.trim().parse::<usize>().ok()?.checked_sub(1)?;
    Some(SubTopicRef::new(module, sub_topic))
}

//
// ─── FLOW ──────────────────────────────────────────────────────────────────────
//

fn watch_games(session: &CourseSession) {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CourseEvent::GameReady { module_title }) => {
                    println!("\nA review game for \"{module_title}\" is ready (press g to play it).");
                }
                Ok(CourseEvent::GameFailed { module_title, .. }) => {
                    println!("\nThe review game for \"{module_title}\" could not be created.");
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for the outcome of every game request, giving up after a while.
async fn await_games(outcomes: &mut broadcast::Receiver<CourseEvent>, expected: usize) {
    let mut seen = 0;
    while seen < expected {
        match tokio::time::timeout(GAME_WAIT, outcomes.recv()).await {
            Ok(Ok(_)) => seen += 1,
            Ok(Err(RecvError::Lagged(missed))) => {
                seen += usize::try_from(missed).unwrap_or(expected);
            }
            Ok(Err(RecvError::Closed)) | Err(_) => break,
        }
    }
}

async fn learn(
    session: &CourseSession,
    terminal: &mut Terminal,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut outcomes = session.subscribe();
    loop {
        let Some(course) = session.course() else {
            return Ok(());
        };
        render::outline(&course);
        if course.is_finished() {
            let completed = course.modules().iter().filter(|m| m.is_completed()).count();
            await_games(&mut outcomes, completed).await;
            println!();
            println!("Course complete. Games you earned:");
            return play_games(&session.games(), terminal);
        }

        let Some(input) = terminal.prompt("\nOpen [m.s], Enter for next, g for games, q to quit:")?
        else {
            return Ok(());
        };
        let at = match input.as_str() {
            "" => course.frontier(),
            "q" => return Ok(()),
            "g" => {
                play_games(&session.games(), terminal)?;
                continue;
            }
            raw => parse_position(raw),
        };
        match at {
            Some(at) => study(session, terminal, at).await?,
            None => println!("Unrecognised choice: {input}"),
        }
    }
}

async fn study(
    session: &CourseSession,
    terminal: &mut Terminal,
    at: SubTopicRef,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading {at}...");
    let course = match session.open_sub_topic(at).await {
        Ok(course) => course,
        Err(err @ (SessionError::Progression(_) | SessionError::ContentLoadFailed { .. })) => {
            println!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let Some(sub_topic) = course.sub_topic(at) else {
        return Ok(());
    };
    let (Some(tutorial), Some(quiz)) = (sub_topic.tutorial(), sub_topic.quiz()) else {
        return Ok(());
    };

    render::tutorial(sub_topic.title(), tutorial);
    let check = tutorial.interactive_check();
    render::question(1, check);
    let Some(choice) = terminal.choose(check)? else {
        return Ok(());
    };
    if check.is_correct(&choice) {
        println!("Correct!");
    } else {
        println!("Not quite: the answer is \"{}\".", check.correct_answer());
    }

    let label = if sub_topic.is_completed() {
        "\nAlready completed. Retake the quiz? [y/N]"
    } else {
        "\nStart the quiz? [Y/n]"
    };
    if !terminal.confirm(label, !sub_topic.is_completed())? {
        return Ok(());
    }

    let mut attempt = QuizAttempt::new(quiz);
    loop {
        for (index, question) in quiz.questions().iter().enumerate() {
            render::question(index + 1, question);
            let Some(option) = terminal.choose(question)? else {
                return Ok(());
            };
            attempt.select(quiz, index, &option)?;
        }

        let submission = session.submit_quiz(at, &mut attempt).await?;
        render::result(&submission.result);
        if let Some(progress) = &submission.progress {
            render::progress(progress);
            return Ok(());
        }
        if submission.result.passed() {
            return Ok(());
        }

        println!("{}", session.quiz_advice(at, &attempt).await?);
        if !terminal.confirm("\nTry again? [Y/n]", true)? {
            return Ok(());
        }
        attempt.retry();
    }
}

//
// ─── GAMES ─────────────────────────────────────────────────────────────────────
//

/// List the earned games and play the ones the learner picks.
fn play_games(
    games: &GameCollection,
    terminal: &mut Terminal,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        render::games(games);
        if games.is_empty() {
            return Ok(());
        }
        let label = format!("\nPlay which game? [1-{}, Enter to go back]:", games.len());
        let Some(raw) = terminal.prompt(&label)? else {
            return Ok(());
        };
        if raw.is_empty() {
            return Ok(());
        }
        match parse_choice(&raw, games.len()).and_then(|index| games.games().get(index)) {
            Some(game) => play(game, terminal)?,
            None => println!("Unrecognised choice: {raw}"),
        }
    }
}

fn play(game: &Game, terminal: &mut Terminal) -> Result<(), Box<dyn std::error::Error>> {
    render::game(game);
    let mut attempt = GameAttempt::new(game);
    let finished = match game.data() {
        GameData::Matching(pairs) => play_matching(game, pairs, &mut attempt, terminal)?,
        GameData::FillInTheBlanks(items) => play_blanks(game, items, &mut attempt, terminal)?,
        GameData::TrueFalse(items) => play_true_false(game, items, &mut attempt, terminal)?,
    };
    if finished {
        render::game_result(&attempt.result(game));
    }
    Ok(())
}

/// Returns `false` if stdin closed before the game was finished.
fn play_matching(
    game: &Game,
    pairs: &[MatchingPair],
    attempt: &mut GameAttempt,
    terminal: &mut Terminal,
) -> Result<bool, Box<dyn std::error::Error>> {
    let definitions = game.data().definitions();
    render::definitions(&definitions);
    for (index, pair) in pairs.iter().enumerate() {
        let label = format!("\"{}\" means [1-{}]:", pair.term, definitions.len());
        loop {
            let Some(picked) = terminal.pick(&label, definitions.len())? else {
                return Ok(false);
            };
            let answer = GameAnswer::Definition(definitions[picked].to_string());
            match attempt.answer(game, index, answer) {
                Ok(true) => {
                    println!("Correct!");
                    break;
                }
                Ok(false) => println!("Incorrect, try again."),
                Err(err @ GameError::DefinitionTaken { .. }) => println!("{err}"),
                Err(err) => return Err(err.into()),
            }
        }
    }
    println!("Congratulations, you matched them all!");
    Ok(true)
}

/// Collect every blank first, then check them all at once.
fn play_blanks(
    game: &Game,
    items: &[FillInTheBlank],
    attempt: &mut GameAttempt,
    terminal: &mut Terminal,
) -> Result<bool, Box<dyn std::error::Error>> {
    for (index, item) in items.iter().enumerate() {
        println!();
        println!("{}. {}", index + 1, item.sentence);
        let Some(word) = terminal.prompt("Your answer:")? else {
            return Ok(false);
        };
        attempt.answer(game, index, GameAnswer::Word(word))?;
    }
    println!();
    for index in 0..items.len() {
        let verdict = match attempt.is_correct(game, index) {
            Some(true) => "correct",
            _ => "incorrect",
        };
        println!("  {}. {verdict}", index + 1);
    }
    Ok(true)
}

fn play_true_false(
    game: &Game,
    items: &[TrueFalseStatement],
    attempt: &mut GameAttempt,
    terminal: &mut Terminal,
) -> Result<bool, Box<dyn std::error::Error>> {
    for (index, item) in items.iter().enumerate() {
        println!();
        println!("{}. {}", index + 1, item.statement);
        let Some(pick) = terminal.truth("True or false? [t/f]:")? else {
            return Ok(false);
        };
        if attempt.answer(game, index, GameAnswer::Truth(pick))? {
            println!("Correct!");
        } else {
            println!("Incorrect.");
        }
    }
    Ok(true)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: interactive learning when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Learn,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with('-') => Command::Learn,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with('-') {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    init_tracing(parsed.verbose);

    // Fail fast on configuration before asking the learner anything.
    let config = ProviderConfig::from_env()?;
    let images = parsed.images.unwrap_or(config.images_enabled);
    let provider = Arc::new(ChatCompletionsProvider::new(config)?);
    let session = CourseSession::new(provider).with_images(images);
    let mut terminal = Terminal::new();

    let topic = match (cmd, parsed.topic) {
        (_, Some(topic)) => topic,
        (Command::Syllabus, None) => {
            return Err(ArgsError::MissingValue { flag: "--topic" }.into());
        }
        (Command::Learn, None) => loop {
            match terminal.prompt("What would you like to learn?")? {
                None => return Ok(()),
                Some(topic) if topic.is_empty() => continue,
                Some(topic) => break topic,
            }
        },
    };

    println!("Designing a course on \"{topic}\"...");
    let course = session.start(&topic).await?;
    match cmd {
        Command::Syllabus => {
            render::outline(&course);
            Ok(())
        }
        Command::Learn => {
            watch_games(&session);
            learn(&session, &mut terminal).await
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
