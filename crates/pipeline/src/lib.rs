//! The conversation pipeline: the heart of Rapport.
//!
//! Each user message goes through the same cycle:
//!
//! 1. **Read** the recent window of turns for the user
//! 2. **Prompt** the completion service for a follow-up question
//! 3. **Store** the user turn and the reply together
//! 4. **Show** both turns in the view
//! 5. **Refresh** the user's profile in the background (summary, personality,
//!    worldview), without delaying the reply

pub mod pipeline;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use pipeline::{ConversationPipeline, DEFAULT_HISTORY_WINDOW, Exchange, ProfileRefresh};
pub use prompt::Purpose;
