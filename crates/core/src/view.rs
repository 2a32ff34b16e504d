//! ChatView trait, the presentation boundary.
//!
//! The pipeline only needs three things from whatever renders the thread:
//! append a turn, replace the whole list, and scroll to the newest entry.
//! Calls are synchronous and cheap; a view that needs to marshal onto another
//! thread does so internally.

use crate::turn::Turn;

pub trait ChatView: Send + Sync {
    /// Append one turn to the end of the rendered list.
    fn append_turn(&self, turn: &Turn);

    /// Replace the rendered list with `turns` (oldest first).
    fn replace_turns(&self, turns: &[Turn]);

    /// Bring the newest turn into view.
    fn scroll_to_bottom(&self);
}

/// A view that renders nothing. Used when the pipeline runs headless.
pub struct NullView;

impl ChatView for NullView {
    fn append_turn(&self, _turn: &Turn) {}

    fn replace_turns(&self, _turns: &[Turn]) {}

    fn scroll_to_bottom(&self) {}
}
