//! Turn, Profile, and Window domain types.
//!
//! These are the value objects that flow through the pipeline:
//! user types a message → a user [`Turn`] is recorded → the model reply becomes
//! a bot [`Turn`] → the recent [`Window`] of turns feeds the derived [`Profile`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Speaker label stored on user turns.
pub const USER_SPEAKER: &str = "User";

/// Speaker label stored on model turns.
pub const BOT_SPEAKER: &str = "Bot";

/// A single message in a conversation, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Owner of the conversation
    pub user_id: String,

    /// Display label ("User" or "Bot")
    pub speaker: String,

    /// The text content
    pub text: String,

    /// Whether the end user wrote this turn
    pub is_user: bool,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a new turn written by the user.
    pub fn user(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            speaker: USER_SPEAKER.into(),
            text: text.into(),
            is_user: true,
            created_at: Utc::now(),
        }
    }

    /// Create a new turn produced by the model.
    pub fn bot(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            speaker: BOT_SPEAKER.into(),
            text: text.into(),
            is_user: false,
            created_at: Utc::now(),
        }
    }
}

/// The derived, continuously overwritten summary of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique key: one live profile per user
    pub user_id: String,

    /// Short personality description ending in a two-word label
    pub personality_summary: String,

    /// Worldview analysis ending in a three-word label
    pub worldview_summary: String,

    /// One-sentence summary of the recent conversation
    pub chat_history_summary: String,

    /// When this record was written
    pub updated_at: DateTime<Utc>,
}

/// The most recent turns for a user, in chronological order.
///
/// Stores hand back turns most-recent-first; the window flips them so prompt
/// rendering reads top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Window {
    turns: Vec<Turn>,
}

impl Window {
    /// Build a window from a most-recent-first slice as returned by a store.
    pub fn from_recent(mut recent: Vec<Turn>) -> Self {
        recent.reverse();
        Self { turns: recent }
    }

    /// Build a window from turns that are already oldest-first.
    pub fn chronological(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_and_bot_constructors() {
        let user = Turn::user("local_user", "Hello!");
        assert!(user.is_user);
        assert_eq!(user.speaker, "User");
        assert_eq!(user.text, "Hello!");

        let bot = Turn::bot("local_user", "Hi there");
        assert!(!bot.is_user);
        assert_eq!(bot.speaker, "Bot");
        assert_ne!(user.id, bot.id);
    }

    #[test]
    fn window_reverses_recent_order() {
        let first = Turn::user("u", "first");
        let second = Turn::bot("u", "second");
        let third = Turn::user("u", "third");

        // Store order: most recent first
        let window = Window::from_recent(vec![third, second, first]);
        let texts: Vec<&str> = window.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_window() {
        let window = Window::from_recent(vec![]);
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn profile_serialization() {
        let profile = Profile {
            user_id: "local_user".into(),
            personality_summary: "Curious and calm".into(),
            worldview_summary: "Hopeful, pragmatic, open".into(),
            chat_history_summary: "Talked about the weather.".into(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("local_user"));
        assert!(json.contains("Curious and calm"));
    }
}
