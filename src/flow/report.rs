//! Reporter flow.
//!
//! Walks one user through identifying a problem message, the reason
//! taxonomy and any additional comments, producing a completed
//! [`ReportRecord`]. Bad input never advances the state; every prompt keeps
//! `cancel` available as the escape hatch.

use super::{selects, GuidedFlow, HELP_KEYWORD, NO_KEYWORD, YES_KEYWORD};
use crate::chat::{parse_message_link, resolve_message, ChannelId, ChatHost, Resolution, UserId};
use crate::records::{ReasonCategory, ReportRecord, ReportSource, RecordStatus, SubjectWho};
use async_trait::async_trait;
use std::sync::Arc;

const MYSELF_KEYWORD: &str = "myself";
const SOMEONE_ELSE_KEYWORD: &str = "someone else";

const LINK_PROMPT: &str = "Please copy paste the link to the message you want to report.\n\
    You can obtain this link by right-clicking the message and clicking `Copy Message Link`.";

const UNRECOGNIZED: &str =
    "I'm sorry, I didn't understand that response. Please try again or say `cancel` to cancel.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportState {
    Start,
    AwaitingMessageLink,
    MessageIdentified,
    AwaitingWho,
    AwaitingHaveAccount,
    AwaitingUsername,
    AwaitingReason,
    AwaitingReasonDetail,
    AwaitingComments,
    Complete,
    Cancelled,
}

/// State machine driving one user's report.
pub struct ReportFlow {
    state: ReportState,
    host: Arc<dyn ChatHost>,
    record: ReportRecord,
    help_message: String,
}

impl ReportFlow {
    /// Start a report. The id is assigned here, before any input is read,
    /// and never changes.
    pub fn new(
        report_id: u64,
        author_id: UserId,
        author_channel_id: ChannelId,
        host: Arc<dyn ChatHost>,
    ) -> Self {
        Self {
            state: ReportState::Start,
            host,
            record: ReportRecord::new(
                report_id,
                author_id,
                Some(author_channel_id),
                ReportSource::UserFiled,
            ),
            help_message: String::new(),
        }
    }

    pub fn record(&self) -> &ReportRecord {
        &self.record
    }

    pub fn into_record(self) -> ReportRecord {
        self.record
    }

    fn reason_prompt() -> String {
        let mut prompt = String::from("Please enter the reason for your report.\n");
        for (i, category) in ReasonCategory::ALL.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. For {}, type `{}`.\n",
                i + 1,
                category.label().to_lowercase(),
                category.keyword()
            ));
        }
        prompt
    }

    fn detail_prompt(category: ReasonCategory) -> String {
        match category.menu() {
            Some(menu) => {
                let mut prompt = format!(
                    "Please select the type of {}.\n",
                    category.label().to_lowercase()
                );
                for (i, entry) in menu.iter().enumerate() {
                    prompt.push_str(&format!(
                        "{}. For {}, type `{}`.\n",
                        i + 1,
                        entry.label,
                        entry.key
                    ));
                }
                prompt
            }
            None => "Please explain the reason for your report.".to_string(),
        }
    }
}

#[async_trait]
impl GuidedFlow for ReportFlow {
    fn cancel(&mut self) -> Vec<String> {
        self.state = ReportState::Cancelled;
        self.record.status = RecordStatus::Cancelled;
        vec!["Report cancelled.".to_string()]
    }

    fn summary(&self) -> String {
        self.record.to_string()
    }

    fn help_text(&self) -> String {
        self.help_message.clone()
    }

    fn is_complete(&self) -> bool {
        matches!(self.state, ReportState::Complete | ReportState::Cancelled)
    }

    async fn advance(&mut self, input: &str) -> Vec<String> {
        match self.state {
            ReportState::Start => {
                let reply = format!(
                    "Thank you for starting the reporting process.\n\
                     Say `cancel` at any time to cancel the report.\n\
                     Say `{}` at any time for more information.\n",
                    HELP_KEYWORD
                );
                self.help_message = LINK_PROMPT.to_string();
                self.state = ReportState::AwaitingMessageLink;
                vec![reply, self.help_message.clone()]
            }

            ReportState::AwaitingMessageLink => {
                let reference = match parse_message_link(input) {
                    Some(reference) => reference,
                    None => {
                        return vec![
                            "I'm sorry, I couldn't read that link. Please try again or say \
                             `cancel` to cancel."
                                .to_string(),
                        ]
                    }
                };
                match resolve_message(self.host.as_ref(), reference).await {
                    Resolution::GuildMissing => vec![
                        "I cannot accept reports of messages from guilds that I'm not in. \
                         Please have the guild owner add me to the guild and try again."
                            .to_string(),
                    ],
                    Resolution::ChannelMissing => vec![
                        "It seems this channel was deleted or never existed. Please try again \
                         or say `cancel` to cancel."
                            .to_string(),
                    ],
                    Resolution::MessageMissing => vec![
                        "It seems this message was deleted or never existed. Please try again \
                         or say `cancel` to cancel."
                            .to_string(),
                    ],
                    Resolution::Resolved(snapshot) => {
                        let excerpt = format!(
                            "```{}: {}```",
                            snapshot.author_name,
                            snapshot.content.replace("```", "``")
                        );
                        self.record.target = Some(reference);
                        self.record.message_excerpt = Some(excerpt.clone());
                        self.help_message = format!(
                            "I found this message: {}\nDoes it look correct? Please respond \
                             with `{}` or `{}`. ",
                            excerpt, YES_KEYWORD, NO_KEYWORD
                        );
                        self.state = ReportState::MessageIdentified;
                        vec!["Thank you! ".to_string(), self.help_message.clone()]
                    }
                }
            }

            ReportState::MessageIdentified => {
                if selects(input, NO_KEYWORD) {
                    self.help_message = LINK_PROMPT.to_string();
                    self.state = ReportState::AwaitingMessageLink;
                    return vec!["I see. Please try again.\n".to_string(), self.help_message.clone()];
                }
                // Anything that isn't a refusal confirms the message.
                self.help_message = format!(
                    "1. If this report involves you directly, please say `{}`.\n\
                     2. If this report does not involve you directly, please say `{}`.\n",
                    MYSELF_KEYWORD, SOMEONE_ELSE_KEYWORD
                );
                self.state = ReportState::AwaitingWho;
                vec![
                    "Thank you! Who is this report regarding?\n".to_string(),
                    self.help_message.clone(),
                ]
            }

            ReportState::AwaitingWho => {
                if selects(input, MYSELF_KEYWORD) {
                    self.record.subject = Some(SubjectWho::Myself);
                    self.help_message = Self::reason_prompt();
                    self.state = ReportState::AwaitingReason;
                    return vec!["Thank you! ".to_string(), self.help_message.clone()];
                }
                if selects(input, SOMEONE_ELSE_KEYWORD) {
                    self.record.subject = Some(SubjectWho::SomeoneElse);
                    self.help_message =
                        format!("Please respond with `{}`/`{}`.", YES_KEYWORD, NO_KEYWORD);
                    self.state = ReportState::AwaitingHaveAccount;
                    return vec![
                        "Thank you! Does this person have an account here? ".to_string(),
                        self.help_message.clone(),
                    ];
                }
                vec![UNRECOGNIZED.to_string()]
            }

            ReportState::AwaitingHaveAccount => {
                if selects(input, YES_KEYWORD) {
                    self.record.has_account = Some(true);
                    self.help_message = "What is their username?".to_string();
                    self.state = ReportState::AwaitingUsername;
                    return vec!["Thank you! ".to_string(), self.help_message.clone()];
                }
                if selects(input, NO_KEYWORD) {
                    self.record.has_account = Some(false);
                    self.help_message = Self::reason_prompt();
                    self.state = ReportState::AwaitingReason;
                    return vec!["Thank you! ".to_string(), self.help_message.clone()];
                }
                vec![UNRECOGNIZED.to_string()]
            }

            ReportState::AwaitingUsername => {
                self.record.other_username = Some(input.trim().to_string());
                self.help_message = Self::reason_prompt();
                self.state = ReportState::AwaitingReason;
                vec!["Thank you! ".to_string(), self.help_message.clone()]
            }

            ReportState::AwaitingReason => {
                let category = ReasonCategory::ALL
                    .iter()
                    .copied()
                    .find(|category| selects(input, category.keyword()));
                match category {
                    Some(category) => {
                        self.record.reason = Some(category);
                        self.help_message = Self::detail_prompt(category);
                        self.state = ReportState::AwaitingReasonDetail;
                        vec![
                            format!("Thank you! You have selected `{}`. ", category.label()),
                            self.help_message.clone(),
                        ]
                    }
                    None => vec![UNRECOGNIZED.to_string()],
                }
            }

            ReportState::AwaitingReasonDetail => {
                match self
                    .record
                    .reason
                    .and_then(|category| category.parse_detail(input))
                {
                    Some(detail) => {
                        self.record.reason_detail = Some(detail);
                        self.help_message =
                            "Please respond with anything else you would like to add to the \
                             report."
                                .to_string();
                        self.state = ReportState::AwaitingComments;
                        vec!["Thank you! ".to_string(), self.help_message.clone()]
                    }
                    None => vec![UNRECOGNIZED.to_string()],
                }
            }

            ReportState::AwaitingComments => {
                self.record.comments = Some(input.trim().to_string());
                self.help_message.clear();
                self.record.status = RecordStatus::Complete;
                self.state = ReportState::Complete;
                vec![
                    "Thank you! Your report has been recorded and will be processed by our \
                     moderation team as soon as possible."
                        .to_string(),
                    format!("Here is a summary of your report:\n{}", self.record),
                ]
            }

            ReportState::Complete | ReportState::Cancelled => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::local::LocalChatHost;
    use crate::chat::{MessageRef, MessageSnapshot};
    use crate::records::ReasonDetail;

    fn host_with_message() -> Arc<LocalChatHost> {
        let host = Arc::new(LocalChatHost::new());
        host.add_message(MessageSnapshot {
            reference: MessageRef {
                guild_id: 1,
                channel_id: 2,
                message_id: 3,
            },
            author_id: 50,
            author_name: "suspect".to_string(),
            content: "pay me or else".to_string(),
        });
        host
    }

    async fn drive(flow: &mut ReportFlow, inputs: &[&str]) {
        for input in inputs {
            flow.handle_message(input).await;
        }
    }

    #[tokio::test]
    async fn test_happy_path_self_harassment() {
        let mut flow = ReportFlow::new(1, 42, 9, host_with_message());
        drive(
            &mut flow,
            &["report", "/1/2/3", "yes", "myself", "harass", "b", "he keeps at it"],
        )
        .await;
        assert!(flow.is_complete());
        let record = flow.into_record();
        assert_eq!(record.status, RecordStatus::Complete);
        assert_eq!(record.reason, Some(ReasonCategory::Harassment));
        assert_eq!(record.reason_detail, Some(ReasonDetail::Bullying));
        assert_eq!(record.comments.as_deref(), Some("he keeps at it"));
        assert_eq!(record.subject, Some(SubjectWho::Myself));
    }

    #[tokio::test]
    async fn test_bad_link_does_not_advance() {
        let mut flow = ReportFlow::new(1, 42, 9, host_with_message());
        flow.handle_message("report").await;
        let replies = flow.handle_message("not a link").await;
        assert!(replies[0].contains("couldn't read that link"));
        // Still accepts a good link afterwards.
        let replies = flow.handle_message("/1/2/3").await;
        assert!(replies[1].contains("Does it look correct?"));
    }

    #[tokio::test]
    async fn test_deleted_message_error_is_distinct() {
        let host = host_with_message();
        host.delete_message(MessageRef {
            guild_id: 1,
            channel_id: 2,
            message_id: 3,
        });
        let mut flow = ReportFlow::new(1, 42, 9, host);
        flow.handle_message("report").await;
        let replies = flow.handle_message("/1/2/3").await;
        assert!(replies[0].contains("message was deleted"));
    }

    #[tokio::test]
    async fn test_no_on_confirmation_restarts_link_collection() {
        let mut flow = ReportFlow::new(1, 42, 9, host_with_message());
        drive(&mut flow, &["report", "/1/2/3"]).await;
        let replies = flow.handle_message("no").await;
        assert!(replies[0].contains("Please try again"));
        let replies = flow.handle_message("/1/2/3").await;
        assert!(replies[1].contains("Does it look correct?"));
    }

    #[tokio::test]
    async fn test_cancel_stops_everything() {
        let mut flow = ReportFlow::new(1, 42, 9, host_with_message());
        drive(&mut flow, &["report", "/1/2/3"]).await;
        let replies = flow.handle_message("cancel").await;
        assert_eq!(replies, vec!["Report cancelled.".to_string()]);
        assert!(flow.is_complete());
        assert!(flow.handle_message("yes").await.is_empty());
        assert_eq!(flow.record().status, RecordStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_help_preserves_state() {
        let mut flow = ReportFlow::new(1, 42, 9, host_with_message());
        drive(&mut flow, &["report", "/1/2/3", "yes"]).await;
        let replies = flow.handle_message("help").await;
        assert!(replies[0].contains("summary of your report"));
        // The flow is still waiting on the who question.
        let replies = flow.handle_message("myself").await;
        assert!(replies[1].contains("reason for your report"));
    }

    #[tokio::test]
    async fn test_someone_else_branch_collects_username() {
        let mut flow = ReportFlow::new(1, 42, 9, host_with_message());
        drive(
            &mut flow,
            &[
                "report",
                "/1/2/3",
                "yes",
                "someone else",
                "yes",
                "target_user",
                "mislead",
                "i",
                "nothing else",
            ],
        )
        .await;
        let record = flow.into_record();
        assert_eq!(record.subject, Some(SubjectWho::SomeoneElse));
        assert_eq!(record.has_account, Some(true));
        assert_eq!(record.other_username.as_deref(), Some("target_user"));
        assert_eq!(record.reason_detail, Some(ReasonDetail::Impersonation));
    }

    #[tokio::test]
    async fn test_unknown_reason_reprompts() {
        let mut flow = ReportFlow::new(1, 42, 9, host_with_message());
        drive(&mut flow, &["report", "/1/2/3", "yes", "myself"]).await;
        let replies = flow.handle_message("because").await;
        assert!(replies[0].contains("didn't understand"));
        let replies = flow.handle_message("explicit").await;
        assert!(replies[0].contains("Explicit Content"));
    }

    #[tokio::test]
    async fn test_report_id_never_changes() {
        let mut flow = ReportFlow::new(77, 42, 9, host_with_message());
        assert_eq!(flow.record().report_id, 77);
        drive(&mut flow, &["report", "/1/2/3", "yes", "myself", "other", "spammy", "done"]).await;
        assert_eq!(flow.record().report_id, 77);
    }
}
