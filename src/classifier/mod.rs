//! Text classification capability surface.
//!
//! The engine asks an external oracle whether a message warrants moderator
//! attention, passing along the sender's decaying history level so borderline
//! messages in an already-flagged conversation are judged more strictly.
//! Implementations:
//!
//! - [`heuristic::HeuristicClassifier`]: deterministic phrase scorer, the
//!   default when no API key is configured
//! - [`openai::OpenAiClassifier`]: chat-completions model behind reqwest

pub mod heuristic;
pub mod openai;

use async_trait::async_trait;

/// What the oracle concluded about one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NotFlagged,
    MaybeFlagged,
    Flagged,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::NotFlagged => "Not Flagged",
            Verdict::MaybeFlagged => "Maybe Flagged",
            Verdict::Flagged => "Flagged",
        }
    }

    /// The history level a verdict leaves behind on the sender.
    pub fn history_level(&self) -> HistoryLevel {
        match self {
            Verdict::NotFlagged => HistoryLevel::None,
            Verdict::MaybeFlagged => HistoryLevel::Some,
            Verdict::Flagged => HistoryLevel::High,
        }
    }
}

/// Per-user classification memory severity, ordered `None < Some < High`.
///
/// One enum serves the tracker, the gate, the classifiers and display code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HistoryLevel {
    None,
    Some,
    High,
}

impl HistoryLevel {
    pub fn label(&self) -> &'static str {
        match self {
            HistoryLevel::None => "None",
            HistoryLevel::Some => "Some History",
            HistoryLevel::High => "High History",
        }
    }

    /// How many of the sender's subsequent messages a fresh flag at this
    /// level stays live for.
    pub fn ttl(&self) -> Option<u32> {
        match self {
            HistoryLevel::None => None,
            HistoryLevel::Some => Some(5),
            HistoryLevel::High => Some(20),
        }
    }
}

/// Classifier operation errors.
///
/// A failed classification is a hard error for callers; it is never coerced
/// into [`Verdict::NotFlagged`].
#[derive(Debug)]
pub enum ClassifierError {
    /// Transport failure talking to the provider
    Request(reqwest::Error),
    /// Provider replied with a non-success status
    Status(u16),
    /// The provider's reply did not map to a known verdict
    Unrecognized(String),
}

impl std::fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierError::Request(e) => write!(f, "Classifier request failed: {}", e),
            ClassifierError::Status(code) => write!(f, "Classifier returned status {}", code),
            ClassifierError::Unrecognized(reply) => {
                write!(f, "Unrecognized classifier reply: {}", reply)
            }
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<reqwest::Error> for ClassifierError {
    fn from(e: reqwest::Error) -> Self {
        ClassifierError::Request(e)
    }
}

/// Trait for classification backends.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one message given the sender's current history level.
    async fn classify(
        &self,
        message: &str,
        history: HistoryLevel,
    ) -> Result<Verdict, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_level_ordering() {
        assert!(HistoryLevel::None < HistoryLevel::Some);
        assert!(HistoryLevel::Some < HistoryLevel::High);
    }

    #[test]
    fn test_verdict_maps_to_history_level() {
        assert_eq!(Verdict::NotFlagged.history_level(), HistoryLevel::None);
        assert_eq!(Verdict::MaybeFlagged.history_level(), HistoryLevel::Some);
        assert_eq!(Verdict::Flagged.history_level(), HistoryLevel::High);
    }

    #[test]
    fn test_ttl_per_level() {
        assert_eq!(HistoryLevel::None.ttl(), None);
        assert_eq!(HistoryLevel::Some.ttl(), Some(5));
        assert_eq!(HistoryLevel::High.ttl(), Some(20));
    }
}
