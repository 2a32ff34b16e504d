//! Prompt construction for the four completion calls.
//!
//! Every prompt starts with the same history block: the window rendered one
//! turn per line, `user:` or `model:` first, oldest at the top. What follows
//! the block decides what the model is asked for.
//!
//! Everything here is pure string building: no I/O, no state.

use rapport_core::turn::Window;

/// First line of every prompt.
pub const HISTORY_HEADER: &str = "Below is the chat history between the user and the model:";

pub const SUMMARY_INSTRUCTION: &str = "Summarize these chat records in one sentence.";

pub const PERSONALITY_INSTRUCTION: &str = "Based on these chat records, describe the user's personality in one sentence, then conclude with a two-word label.";

pub const WORLDVIEW_INSTRUCTION: &str = "Based on these chat records, analyse the user's worldview carefully from a psychological perspective, then conclude with a three-word label.";

/// What a completion call is for. Drives the prompt and the fallback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Reply,
    Summary,
    Personality,
    Worldview,
}

impl Purpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Purpose::Reply => "reply",
            Purpose::Summary => "summary",
            Purpose::Personality => "personality",
            Purpose::Worldview => "worldview",
        }
    }

    /// Text used when the service answers without content.
    pub fn placeholder(self) -> &'static str {
        match self {
            Purpose::Reply => "no valid answer",
            Purpose::Summary => "no summary",
            Purpose::Personality => "no personality summary",
            Purpose::Worldview => "no worldview summary",
        }
    }

    /// Prefix for the text used when the call itself fails.
    pub fn failure_prefix(self) -> &'static str {
        match self {
            Purpose::Reply => "failed to generate question",
            Purpose::Summary => "failed to generate summary",
            Purpose::Personality => "failed to generate personality summary",
            Purpose::Worldview => "failed to generate worldview summary",
        }
    }
}

/// Render the window as `user: ...` / `model: ...` lines, oldest first.
pub fn render_history(window: &Window) -> String {
    window
        .turns()
        .iter()
        .map(|turn| {
            let role = if turn.is_user { "user" } else { "model" };
            format!("{role}: {}", turn.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whitespace-separated tokens longer than two characters.
///
/// No stemming, no dedup, no stop words: repeated tokens stay repeated.
pub fn extract_keywords(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .map(String::from)
        .collect()
}

fn with_history(window: &Window, tail: &str) -> String {
    format!("{HISTORY_HEADER}\n{}\n{tail}", render_history(window))
}

/// Prompt for the visible reply: history, the new line, then a request for a
/// question built around the new line's keywords.
pub fn build_reply_prompt(window: &Window, new_text: &str) -> String {
    let keywords = extract_keywords(new_text).join(", ");
    with_history(
        window,
        &format!(
            "The user says: {new_text}.\nBased on these keywords \"{keywords}\", generate a specific and valuable question."
        ),
    )
}

pub fn build_summary_prompt(window: &Window) -> String {
    with_history(window, SUMMARY_INSTRUCTION)
}

pub fn build_personality_prompt(window: &Window) -> String {
    with_history(window, PERSONALITY_INSTRUCTION)
}

pub fn build_worldview_prompt(window: &Window) -> String {
    with_history(window, WORLDVIEW_INSTRUCTION)
}
