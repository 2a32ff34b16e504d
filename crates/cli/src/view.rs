//! Terminal rendering of the chat thread.

use rapport_core::turn::Turn;
use rapport_core::view::ChatView;
use std::io::Write;
use tracing::debug;

/// Prints turns to stdout with a speaker prefix.
///
/// In interactive mode the user's line is already on screen, so only replayed
/// history echoes user turns.
pub struct TerminalView {
    echo_user: bool,
}

impl TerminalView {
    pub fn new(echo_user: bool) -> Self {
        Self { echo_user }
    }
}

fn print_turn(turn: &Turn) {
    let prefix = if turn.is_user { "You" } else { "Rapport" };
    for line in turn.text.lines() {
        println!("  {prefix} > {line}");
    }
}

impl ChatView for TerminalView {
    fn append_turn(&self, turn: &Turn) {
        if turn.is_user && !self.echo_user {
            return;
        }
        print_turn(turn);
        if !turn.is_user {
            println!();
        }
    }

    fn replace_turns(&self, turns: &[Turn]) {
        for turn in turns {
            print_turn(turn);
        }
        if !turns.is_empty() {
            println!();
        }
    }

    fn scroll_to_bottom(&self) {
        if let Err(e) = std::io::stdout().flush() {
            debug!("stdout flush failed: {e}");
        }
    }
}
