//! Chat-completions classifier.
//!
//! Sends the message plus the sender's history label to a hosted model with
//! a fixed few-shot framing and maps the completion text back onto a
//! [`Verdict`]. Anything the model says outside the three known labels is an
//! error, not a pass.

use super::{Classifier, ClassifierError, HistoryLevel, Verdict};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const NOT_FLAGGED_LABEL: &str = "Not Coercion";
const MAYBE_FLAGGED_LABEL: &str = "Potentially Coercion";
const FLAGGED_LABEL: &str = "Coercion";

fn history_label(history: HistoryLevel) -> String {
    match history {
        HistoryLevel::None => "None".to_string(),
        HistoryLevel::Some => format!("Flagged: {}", MAYBE_FLAGGED_LABEL),
        HistoryLevel::High => format!("Flagged: {}", FLAGGED_LABEL),
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Hosted-model [`Classifier`] over the chat-completions API.
pub struct OpenAiClassifier {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClassifier {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    fn example(history: HistoryLevel, message: &str, label: &'static str) -> [ChatMessage; 2] {
        [
            ChatMessage {
                role: "user",
                content: format!("History: '{}' Message: {}", history_label(history), message),
            },
            ChatMessage {
                role: "assistant",
                content: label.to_string(),
            },
        ]
    }

    fn build_messages(&self, message: &str, history: HistoryLevel) -> Vec<ChatMessage> {
        let system = ChatMessage {
            role: "system",
            content: format!(
                "You are a content moderation system for a chat platform. \
                 Classify the input message as either '{}', '{}', or '{}'. \
                 A message may come from a conversation that was previously \
                 flagged; you will be given that flag as the history. Possible \
                 history values are 'None', 'Flagged: {}', and 'Flagged: {}'.",
                FLAGGED_LABEL,
                MAYBE_FLAGGED_LABEL,
                NOT_FLAGGED_LABEL,
                MAYBE_FLAGGED_LABEL,
                FLAGGED_LABEL
            ),
        };

        let mut messages = vec![system];
        let examples = [
            Self::example(
                HistoryLevel::None,
                "I found naked pictures of you.",
                MAYBE_FLAGGED_LABEL,
            ),
            Self::example(HistoryLevel::None, "I love you", NOT_FLAGGED_LABEL),
            Self::example(HistoryLevel::None, "give me money", NOT_FLAGGED_LABEL),
            Self::example(HistoryLevel::Some, "give me money", FLAGGED_LABEL),
            Self::example(HistoryLevel::None, "Send me nudes.", MAYBE_FLAGGED_LABEL),
            Self::example(HistoryLevel::Some, "Send me nudes.", FLAGGED_LABEL),
            Self::example(
                HistoryLevel::None,
                "Send me nudes or I'll post your photos online",
                FLAGGED_LABEL,
            ),
            Self::example(
                HistoryLevel::None,
                "I found some sensitive photos of you.",
                MAYBE_FLAGGED_LABEL,
            ),
            Self::example(
                HistoryLevel::High,
                "I found some sensitive photos of you.",
                FLAGGED_LABEL,
            ),
            Self::example(
                HistoryLevel::None,
                "I found some sensitive photos of you. Maybe we could work out a deal?",
                FLAGGED_LABEL,
            ),
        ];
        for pair in examples {
            messages.extend(pair);
        }
        messages.push(ChatMessage {
            role: "user",
            content: format!(
                "History: '{}' Message: {}",
                history_label(history),
                message
            ),
        });
        messages
    }

    fn parse_verdict(reply: &str) -> Result<Verdict, ClassifierError> {
        // Longest label first: every label contains "Coercion".
        let reply = reply.trim();
        if reply.eq_ignore_ascii_case(MAYBE_FLAGGED_LABEL) {
            Ok(Verdict::MaybeFlagged)
        } else if reply.eq_ignore_ascii_case(NOT_FLAGGED_LABEL) {
            Ok(Verdict::NotFlagged)
        } else if reply.eq_ignore_ascii_case(FLAGGED_LABEL) {
            Ok(Verdict::Flagged)
        } else {
            Err(ClassifierError::Unrecognized(reply.to_string()))
        }
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(
        &self,
        message: &str,
        history: HistoryLevel,
    ) -> Result<Verdict, ClassifierError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.build_messages(message, history),
        };

        let response = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        let reply = body
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| ClassifierError::Unrecognized("empty completion".to_string()))?;

        Self::parse_verdict(reply)
    }
}
