//! Moderator review flow.
//!
//! Walks one moderator through loading a report by number, assessing
//! credibility and danger, and recording a disposition. Mod-channel alerts go
//! out as the review progresses; updates for the original reporter are
//! queued on the record and delivered by the router once the review
//! completes, never before.

use super::{selects, GuidedFlow, NO_KEYWORD, YES_KEYWORD};
use crate::context::AppContext;
use crate::records::store::LoadedReport;
use crate::records::{
    Credibility, DangerAssessment, DecisionAction, RecordStatus, ReportSource, ReviewRecord,
};
use crate::chat::UserId;
use async_trait::async_trait;
use std::sync::Arc;

const MAX_PENALTY_KEYWORD: &str = "max penalty";

const REPORT_NUMBER_PROMPT: &str = "Please enter the report number you wish to review.\n";

const UNRECOGNIZED: &str =
    "I'm sorry, I didn't understand that response. Please try again or say `cancel` to cancel.";

fn credibility_prompt() -> String {
    format!(
        "Is this a credible report? Please say `{}` or `{}`.",
        YES_KEYWORD, NO_KEYWORD
    )
}

fn danger_prompt() -> String {
    format!(
        "Is the user in any immediate danger? Please say `{}` or `{}`.",
        YES_KEYWORD, NO_KEYWORD
    )
}

fn decision_prompt() -> String {
    format!(
        "Based on the contents of the report, what steps should be taken?\n\
         The options include:\n\
         1. No action\n\
         2. Remove post\n\
         3. Offending account temporary suspension/permanent ban\n\
         4. Contact law enforcement\n\
         For option 1 say: `{}`\n\
         For option 2 say: `{}`\n\
         For option 3 say: `{}`\n\
         For option 4 say: `{}`\n\
         For both option 3 and 4 say: `{}`\n",
        DecisionAction::NoAction.keyword(),
        DecisionAction::RemovePost.keyword(),
        DecisionAction::BanOffender.keyword(),
        DecisionAction::EngageLawEnforcement.keyword(),
        MAX_PENALTY_KEYWORD
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewState {
    Start,
    AwaitingReportNumber,
    AwaitingFlagConfirm,
    AwaitingCredibility,
    AwaitingDanger,
    AwaitingDecision,
    Complete,
    Cancelled,
}

/// State machine driving one moderator's review.
pub struct ReviewFlow {
    state: ReviewState,
    ctx: Arc<AppContext>,
    record: ReviewRecord,
    report: Option<LoadedReport>,
    help_message: String,
}

impl ReviewFlow {
    /// Start a review. The id is assigned here, before any input is read.
    pub fn new(review_id: u64, moderator_id: UserId, ctx: Arc<AppContext>) -> Self {
        Self {
            state: ReviewState::Start,
            ctx,
            record: ReviewRecord::new(review_id, moderator_id),
            report: None,
            help_message: String::new(),
        }
    }

    pub fn record(&self) -> &ReviewRecord {
        &self.record
    }

    /// The record plus the loaded report it disposed of.
    pub fn into_parts(self) -> (ReviewRecord, Option<LoadedReport>) {
        (self.record, self.report)
    }

    fn followup_header(&self) -> String {
        match self.record.report_id {
            Some(id) => format!("Update regarding report number {}.\n", id),
            None => "Update regarding your report.\n".to_string(),
        }
    }

    fn report_render(&self) -> String {
        self.report
            .as_ref()
            .map(|report| report.record.to_string())
            .unwrap_or_default()
    }

    fn target_link(&self) -> String {
        self.report
            .as_ref()
            .and_then(|report| report.record.target)
            .map(|reference| reference.link())
            .unwrap_or_else(|| "(unresolved)".to_string())
    }

    /// Best-effort notification to the guild's moderation channel.
    async fn notify_mod_channel(&self, text: &str) {
        let channel = self
            .record
            .guild_id
            .and_then(|guild_id| self.ctx.mod_channel(guild_id));
        match channel {
            Some(channel) => {
                if let Err(e) = self.ctx.host.send(channel, text).await {
                    log::warn!(
                        "Review {}: moderation channel send failed: {}",
                        self.record.review_id,
                        e
                    );
                }
            }
            None => log::warn!(
                "Review {}: no moderation channel known, dropping notice",
                self.record.review_id
            ),
        }
    }

    async fn apply_action(&mut self, action: DecisionAction) {
        self.record.decision.push(action);
        let header = self.followup_header();
        match action {
            DecisionAction::NoAction => {
                self.record
                    .followups
                    .push(format!("{}-No action will be taken.", header));
            }
            DecisionAction::RemovePost => {
                self.record
                    .followups
                    .push(format!("{}-The post will be removed.", header));
                self.notify_mod_channel(&format!("--Remove message: {}--", self.target_link()))
                    .await;
            }
            DecisionAction::BanOffender => {
                self.record
                    .followups
                    .push(format!("{}-The offending account will be suspended.", header));
                self.notify_mod_channel(&format!(
                    "--Ban offender from message: {}--",
                    self.target_link()
                ))
                .await;
            }
            DecisionAction::EngageLawEnforcement => {
                self.record
                    .followups
                    .push(format!("{}-Law enforcement will be engaged.", header));
                self.notify_mod_channel(&format!(
                    "--Please engage law enforcement!--\n{}",
                    self.report_render()
                ))
                .await;
            }
        }
    }
}

#[async_trait]
impl GuidedFlow for ReviewFlow {
    fn cancel(&mut self) -> Vec<String> {
        self.state = ReviewState::Cancelled;
        self.record.status = RecordStatus::Cancelled;
        vec!["Review cancelled.".to_string()]
    }

    fn summary(&self) -> String {
        self.record.to_string()
    }

    fn help_text(&self) -> String {
        self.help_message.clone()
    }

    fn is_complete(&self) -> bool {
        matches!(self.state, ReviewState::Complete | ReviewState::Cancelled)
    }

    async fn advance(&mut self, input: &str) -> Vec<String> {
        match self.state {
            ReviewState::Start => {
                self.help_message = REPORT_NUMBER_PROMPT.to_string();
                self.state = ReviewState::AwaitingReportNumber;
                vec![self.help_message.clone()]
            }

            ReviewState::AwaitingReportNumber => {
                let loaded = match input.trim().parse::<u64>() {
                    Ok(report_id) => self
                        .ctx
                        .store
                        .load_report(report_id, self.ctx.host.as_ref())
                        .await
                        .ok(),
                    Err(_) => None,
                };
                let loaded = match loaded {
                    Some(loaded) => loaded,
                    None => {
                        return vec![
                            "Error loading report. Please try again.\n".to_string(),
                            self.help_message.clone(),
                        ]
                    }
                };

                self.record.report_id = Some(loaded.record.report_id);
                self.record.guild_id = loaded.record.target.map(|t| t.guild_id);
                let rendered = loaded.record.to_string();
                let auto_flagged = loaded.record.source == ReportSource::AutoFlagged;
                self.report = Some(loaded);

                if auto_flagged {
                    self.help_message = format!(
                        "Can you tell who is the victim and offender in this report? Please \
                         say `{}` or `{}`.",
                        YES_KEYWORD, NO_KEYWORD
                    );
                    self.state = ReviewState::AwaitingFlagConfirm;
                } else {
                    self.help_message = credibility_prompt();
                    self.state = ReviewState::AwaitingCredibility;
                }
                vec![
                    "Please review this report.\n".to_string(),
                    rendered,
                    self.help_message.clone(),
                ]
            }

            ReviewState::AwaitingFlagConfirm => {
                // Either answer proceeds; a "no" adds a referral note.
                self.help_message = credibility_prompt();
                if selects(input, NO_KEYWORD) {
                    self.help_message =
                        format!("Please contact a specialized team.\n{}", self.help_message);
                }
                self.state = ReviewState::AwaitingCredibility;
                vec![self.help_message.clone()]
            }

            ReviewState::AwaitingCredibility => {
                if selects(input, YES_KEYWORD) {
                    self.record.credibility = Credibility::Credible;
                    self.help_message = danger_prompt();
                    self.state = ReviewState::AwaitingDanger;
                    return vec![self.help_message.clone()];
                }
                if selects(input, NO_KEYWORD) {
                    self.record.credibility = Credibility::NotCredible;
                    self.apply_action(DecisionAction::NoAction).await;
                    self.record.status = RecordStatus::Complete;
                    self.state = ReviewState::Complete;
                    return vec!["No action necessary.".to_string()];
                }
                vec![UNRECOGNIZED.to_string(), self.help_message.clone()]
            }

            ReviewState::AwaitingDanger => {
                if selects(input, YES_KEYWORD) {
                    self.record.danger = DangerAssessment::Immediate;
                    self.help_message = decision_prompt();
                    self.state = ReviewState::AwaitingDecision;
                    self.notify_mod_channel(&format!(
                        "Detected Immediate Danger!\n{}",
                        self.report_render()
                    ))
                    .await;
                    return vec![
                        "Please contact a specialized team to make a final outcome on this \
                         report."
                            .to_string(),
                        self.help_message.clone(),
                    ];
                }
                if selects(input, NO_KEYWORD) {
                    self.record.danger = DangerAssessment::NotImmediate;
                    self.record.victim_resources = Some("*Resources for the victim*".to_string());
                    self.help_message = decision_prompt();
                    self.state = ReviewState::AwaitingDecision;
                    return vec![
                        "Contact the relevant stakeholders.".to_string(),
                        self.help_message.clone(),
                    ];
                }
                vec![UNRECOGNIZED.to_string(), self.help_message.clone()]
            }

            ReviewState::AwaitingDecision => {
                let actions: &[DecisionAction] = if selects(input, DecisionAction::NoAction.keyword())
                {
                    &[DecisionAction::NoAction]
                } else if selects(input, DecisionAction::RemovePost.keyword()) {
                    &[DecisionAction::RemovePost]
                } else if selects(input, DecisionAction::BanOffender.keyword()) {
                    &[DecisionAction::BanOffender]
                } else if selects(input, DecisionAction::EngageLawEnforcement.keyword()) {
                    &[DecisionAction::EngageLawEnforcement]
                } else if selects(input, MAX_PENALTY_KEYWORD) {
                    &[
                        DecisionAction::BanOffender,
                        DecisionAction::EngageLawEnforcement,
                    ]
                } else {
                    // Unknown input here is dropped without a reply or a
                    // transition. Kept as-is; see DESIGN.md.
                    return Vec::new();
                };

                for action in actions {
                    self.apply_action(*action).await;
                }
                self.record.status = RecordStatus::Complete;
                self.state = ReviewState::Complete;

                match actions.last() {
                    Some(DecisionAction::NoAction) => vec![
                        "The user who submitted the report will be notified that no action \
                         will be taken."
                            .to_string(),
                    ],
                    Some(DecisionAction::EngageLawEnforcement) => {
                        vec!["Law enforcement will be contacted.".to_string()]
                    }
                    _ => vec!["The victim will be notified of the actions taken.".to_string()],
                }
            }

            ReviewState::Complete | ReviewState::Cancelled => Vec::new(),
        }
    }
}
