//! Prompt text sent with each request. Output shape is enforced separately
//! through the response schema.

use std::fmt::Write as _;

use course_core::model::{MIN_GAME_ITEMS, OPTIONS_PER_QUESTION, QUIZ_LENGTH, QuizMistake};

#[must_use]
pub fn syllabus(topic: &str) -> String {
    format!(
        "You design online courses. Build a syllabus for a course on \"{topic}\".\n\
         Split it into logical modules, each with several focused sub-topics, ordered \
         from fundamentals to advanced material. Give every sub-topic a one-sentence \
         description.\n\
         Reply with a JSON object matching the provided schema."
    )
}

#[must_use]
pub fn tutorial(sub_topic_title: &str, description: &str) -> String {
    format!(
        "You are an experienced teacher. Write a structured tutorial for the sub-topic \
         \"{sub_topic_title}\" ({description}).\n\
         Sections:\n\
         - introduction: one engaging paragraph.\n\
         - coreConcepts: 2 to 4 concepts, each with a title and a detailed explanation.\n\
         - keyTakeaway: the single most important point, stated briefly.\n\
         - interactiveCheck: one multiple-choice question with exactly {OPTIONS_PER_QUESTION} \
         options; correctAnswer must be copied verbatim from the options.\n\
         Use Markdown (bold, italics, '-' bullet lists, `code`) in the text fields and keep \
         the tone friendly for beginners.\n\
         Reply with a JSON object matching the provided schema."
    )
}

#[must_use]
pub fn quiz(sub_topic_title: &str) -> String {
    format!(
        "Write a {QUIZ_LENGTH}-question multiple-choice quiz on \"{sub_topic_title}\".\n\
         Every question has exactly {OPTIONS_PER_QUESTION} options and one correct answer. \
         correctAnswer must match one of the options character for character.\n\
         Reply with a JSON object matching the provided schema."
    )
}

#[must_use]
pub fn game(module_title: &str) -> String {
    format!(
        "You design small learning games. Create one game that reviews the module \
         \"{module_title}\".\n\
         Pick one gameType: \"matching\", \"fill-in-the-blanks\" or \"true-false\". \
         Give it a title, short instructions and at least {MIN_GAME_ITEMS} data items:\n\
         - matching: items with term and definition.\n\
         - fill-in-the-blanks: items with sentence (use ___ for the blank) and answer.\n\
         - true-false: items with statement and isTrue.\n\
         Leave the fields of the other game types out.\n\
         Reply with a JSON object matching the provided schema."
    )
}

#[must_use]
pub fn quiz_advice(sub_topic_title: &str, mistakes: &[QuizMistake]) -> String {
    let mut prompt = format!(
        "A learner just took a quiz on \"{sub_topic_title}\" and missed these questions:\n"
    );
    for (n, mistake) in mistakes.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. {} (answered \"{}\", correct \"{}\")",
            n + 1,
            mistake.question,
            mistake.wrong_answer,
            mistake.correct_answer
        );
    }
    prompt.push_str(
        "In two or three encouraging sentences, tell them which ideas to review before \
         retrying. Reply with a JSON object matching the provided schema.",
    );
    prompt
}

#[must_use]
pub fn concept_image(sub_topic_title: &str, concept_title: &str) -> String {
    format!(
        "A clean, friendly illustration explaining \"{concept_title}\" in the context of \
         \"{sub_topic_title}\". No text in the image."
    )
}

#[must_use]
pub fn intro_image(sub_topic_title: &str) -> String {
    format!("A wide, inviting header illustration for a lesson on \"{sub_topic_title}\". No text.")
}
