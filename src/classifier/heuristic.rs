//! Heuristic coercion classifier.
//!
//! Deterministic phrase scoring over the message text, tightened by the
//! sender's history level. Used as the default oracle when no API key is
//! configured, and handy anywhere a reproducible classifier is needed.

use super::{Classifier, ClassifierError, HistoryLevel, Verdict};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

/// Phrases signalling a demand backed by leverage.
const DEMAND_PHRASES: &[&str] = &[
    "send me",
    "pay me",
    "give me money",
    "transfer",
    "bitcoin",
    "or else",
    "or i will",
    "or i'll",
    "what's stopping me",
    "unless you",
];

/// Phrases signalling leverage over the target.
const LEVERAGE_PHRASES: &[&str] = &[
    "photos of you",
    "pictures of you",
    "naked",
    "nudes",
    "sensitive photos",
    "sensitive information",
    "post them online",
    "share them",
    "everyone will see",
    "your family will see",
];

/// Crude money-amount mention, e.g. "$500" or "500 dollars".
static MONEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$\d+|\d+\s*(dollars|usd|btc))").expect("Invalid money regex"));

/// Deterministic phrase-scoring [`Classifier`].
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    /// Score at or above which a message is maybe-flagged
    pub maybe_threshold: f32,
    /// Score at or above which a message is flagged outright
    pub flag_threshold: f32,
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self {
            maybe_threshold: 0.35,
            flag_threshold: 0.7,
        }
    }
}

impl HeuristicClassifier {
    pub fn new(maybe_threshold: f32, flag_threshold: f32) -> Self {
        Self {
            maybe_threshold,
            flag_threshold,
        }
    }

    /// Score one message; higher means more likely coercion.
    fn score(&self, message: &str, history: HistoryLevel) -> f32 {
        let text = message.to_lowercase();
        let mut score = 0.0f32;

        let demands = DEMAND_PHRASES.iter().filter(|p| text.contains(**p)).count();
        let leverage = LEVERAGE_PHRASES
            .iter()
            .filter(|p| text.contains(**p))
            .count();

        if demands > 0 {
            score += 0.3;
        }
        if leverage > 0 {
            score += 0.4;
        }
        // A demand and leverage in the same message is the signature shape.
        if demands > 0 && leverage > 0 {
            score += 0.3;
        }
        if MONEY_REGEX.is_match(&text) {
            score += 0.15;
        }

        // A previously flagged conversation is judged more strictly.
        score += match history {
            HistoryLevel::None => 0.0,
            HistoryLevel::Some => 0.2,
            HistoryLevel::High => 0.35,
        };

        score
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    async fn classify(
        &self,
        message: &str,
        history: HistoryLevel,
    ) -> Result<Verdict, ClassifierError> {
        let score = self.score(message, history);
        let verdict = if score >= self.flag_threshold {
            Verdict::Flagged
        } else if score >= self.maybe_threshold {
            Verdict::MaybeFlagged
        } else {
            Verdict::NotFlagged
        };
        log::debug!("Heuristic classification: score {:.2} -> {}", score, verdict.label());
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_benign_message_not_flagged() {
        let classifier = HeuristicClassifier::default();
        let verdict = classifier
            .classify("see you at practice tomorrow", HistoryLevel::None)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::NotFlagged);
    }

    #[tokio::test]
    async fn test_leverage_alone_is_maybe() {
        let classifier = HeuristicClassifier::default();
        let verdict = classifier
            .classify("I found naked pictures of you", HistoryLevel::None)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::MaybeFlagged);
    }

    #[tokio::test]
    async fn test_demand_plus_leverage_is_flagged() {
        let classifier = HeuristicClassifier::default();
        let verdict = classifier
            .classify(
                "send me $500 or I'll post them online",
                HistoryLevel::None,
            )
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Flagged);
    }

    #[tokio::test]
    async fn test_history_escalates_borderline_message() {
        let classifier = HeuristicClassifier::default();
        let fresh = classifier
            .classify("give me money", HistoryLevel::None)
            .await
            .unwrap();
        let primed = classifier
            .classify("give me money", HistoryLevel::High)
            .await
            .unwrap();
        assert_eq!(fresh, Verdict::NotFlagged);
        assert_eq!(primed, Verdict::MaybeFlagged);
    }
}
