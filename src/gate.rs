//! Classification gate.
//!
//! Combines one inbound guild message with the sender's decaying history,
//! calls the external classifier, updates the history, and decides whether
//! the message escalates to the moderation channel.

use crate::chat::UserId;
use crate::classifier::{Classifier, ClassifierError, HistoryLevel, Verdict};
use crate::history::HistoryTracker;
use std::sync::Arc;

/// Outcome of evaluating one message.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Whether the message should be escalated to moderators
    pub escalate: bool,
    /// Moderator-facing line: verdict, history context, remaining memory
    pub display: String,
}

/// Evaluates guild messages against the classifier, with history bias.
pub struct ClassificationGate {
    classifier: Arc<dyn Classifier>,
    history: HistoryTracker,
}

impl ClassificationGate {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            history: HistoryTracker::new(),
        }
    }

    /// Evaluate one message from `user_id`.
    ///
    /// A classifier failure is returned to the caller as-is. Swallowing it
    /// would let a broken oracle wave everything through, so there is no
    /// "treat as safe" fallback here.
    pub async fn evaluate(
        &self,
        user_id: UserId,
        text: &str,
    ) -> Result<Evaluation, ClassifierError> {
        let context = self.history.tick(user_id);
        let verdict = self.classifier.classify(text, context).await?;

        let escalate = verdict != Verdict::NotFlagged;
        if escalate {
            self.history.record(user_id, verdict.history_level());
        }

        let memory = match self.history.peek(user_id) {
            Some((level, remaining)) => {
                format!("{} for {} more message(s)", level.label(), remaining)
            }
            None => HistoryLevel::None.label().to_string(),
        };
        let display = format!(
            "Evaluated: `{}` | History going in: `{}` | Memory: `{}`",
            verdict.label(),
            context.label(),
            memory
        );

        Ok(Evaluation { escalate, display })
    }

    /// The underlying tracker, for inspection.
    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays a scripted verdict sequence and records the history context
    /// it was called with.
    struct ScriptedClassifier {
        script: Mutex<Vec<Result<Verdict, ClassifierError>>>,
        seen: Mutex<Vec<HistoryLevel>>,
    }

    impl ScriptedClassifier {
        fn new(script: Vec<Result<Verdict, ClassifierError>>) -> Self {
            Self {
                script: Mutex::new(script),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Classifier for ScriptedClassifier {
        async fn classify(
            &self,
            _message: &str,
            history: HistoryLevel,
        ) -> Result<Verdict, ClassifierError> {
            self.seen.lock().unwrap().push(history);
            self.script.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn test_not_flagged_does_not_escalate() {
        let gate = ClassificationGate::new(Arc::new(ScriptedClassifier::new(vec![Ok(
            Verdict::NotFlagged,
        )])));
        let eval = gate.evaluate(1, "hello").await.unwrap();
        assert!(!eval.escalate);
        assert!(gate.history().peek(1).is_none());
    }

    #[tokio::test]
    async fn test_flagged_escalates_and_records_high() {
        let gate = ClassificationGate::new(Arc::new(ScriptedClassifier::new(vec![Ok(
            Verdict::Flagged,
        )])));
        let eval = gate.evaluate(1, "threat").await.unwrap();
        assert!(eval.escalate);
        assert_eq!(gate.history().peek(1), Some((HistoryLevel::High, 20)));
    }

    #[tokio::test]
    async fn test_maybe_after_flagged_keeps_high() {
        let gate = ClassificationGate::new(Arc::new(ScriptedClassifier::new(vec![
            Ok(Verdict::Flagged),
            Ok(Verdict::MaybeFlagged),
        ])));
        gate.evaluate(1, "first").await.unwrap();
        gate.evaluate(1, "second").await.unwrap();
        let (level, remaining) = gate.history().peek(1).unwrap();
        assert_eq!(level, HistoryLevel::High);
        // The second evaluation burned a turn and Maybe could not overwrite.
        assert_eq!(remaining, 19);
    }

    #[tokio::test]
    async fn test_history_context_passed_to_classifier() {
        let classifier = Arc::new(ScriptedClassifier::new(vec![
            Ok(Verdict::MaybeFlagged),
            Ok(Verdict::NotFlagged),
        ]));
        let gate = ClassificationGate::new(classifier.clone());
        gate.evaluate(1, "first").await.unwrap();
        gate.evaluate(1, "second").await.unwrap();
        let seen = classifier.seen.lock().unwrap();
        assert_eq!(*seen, vec![HistoryLevel::None, HistoryLevel::Some]);
    }

    #[tokio::test]
    async fn test_classifier_error_propagates() {
        let gate = ClassificationGate::new(Arc::new(ScriptedClassifier::new(vec![Err(
            ClassifierError::Status(500),
        )])));
        assert!(gate.evaluate(1, "anything").await.is_err());
    }
}
