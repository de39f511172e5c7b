//! Guided conversation flows.
//!
//! Both the reporter flow and the moderator review flow are keyword-driven
//! state machines over DM text. The shared plumbing lives here: one keyword
//! matching discipline for every vocabulary, and a [`GuidedFlow`] trait whose
//! provided `handle_message` intercepts `cancel` and `help` uniformly before
//! the flow-specific transition logic runs.

pub mod report;
pub mod review;

pub use report::ReportFlow;
pub use review::ReviewFlow;

use async_trait::async_trait;

pub const START_REPORT_KEYWORD: &str = "report";
pub const START_REVIEW_KEYWORD: &str = "review";
pub const START_REVIEW_ALT_KEYWORD: &str = "modreview";
pub const CANCEL_KEYWORD: &str = "cancel";
pub const HELP_KEYWORD: &str = "help";
pub const YES_KEYWORD: &str = "yes";
pub const NO_KEYWORD: &str = "no";

/// Matching for the global keywords (`cancel`, `help`, the start commands):
/// case-insensitive prefix match on the trimmed input.
pub fn keyword(input: &str, word: &str) -> bool {
    input.trim().to_lowercase().starts_with(word)
}

/// Matching for menu selections: the trimmed, lowercased input either starts
/// with the option's keyword or is itself a non-empty prefix of it, so `h`
/// picks `harass` and `no way` still counts as `no`.
///
/// The global keywords deliberately do not use this; otherwise `c` and `h`
/// would be swallowed by `cancel` and `help` instead of reaching the menus
/// that use them as keys.
pub fn selects(input: &str, word: &str) -> bool {
    let input = input.trim().to_lowercase();
    !input.is_empty() && (input.starts_with(word) || word.starts_with(&input))
}

/// A per-user, per-conversation state machine.
///
/// `handle_message` is the only entry point the router calls. The provided
/// implementation handles the keywords every state honors and refuses input
/// once the flow has finished.
#[async_trait]
pub trait GuidedFlow: Send {
    /// Move to the cancelled state and say so.
    fn cancel(&mut self) -> Vec<String>;

    /// A render of everything gathered so far.
    fn summary(&self) -> String;

    /// The prompt for the current state.
    fn help_text(&self) -> String;

    /// Flow-specific transition logic for one message.
    async fn advance(&mut self, input: &str) -> Vec<String>;

    /// True once the flow reached its complete or cancelled state.
    fn is_complete(&self) -> bool;

    /// Current field values plus the current prompt; no state change.
    fn help(&self) -> Vec<String> {
        vec![
            format!("Here's a summary of your report so far:\n{}", self.summary()),
            format!(
                "{}You may say `{}` at any time to cancel this report.\n",
                self.help_text(),
                CANCEL_KEYWORD
            ),
        ]
    }

    /// Dispatch one inbound message, returning the reply lines in order.
    async fn handle_message(&mut self, input: &str) -> Vec<String> {
        if self.is_complete() {
            return Vec::new();
        }
        if keyword(input, CANCEL_KEYWORD) {
            return self.cancel();
        }
        if keyword(input, HELP_KEYWORD) {
            return self.help();
        }
        self.advance(input).await
    }
}
