//! Session routing.
//!
//! Maps each user to at most one in-progress flow, dispatches DM traffic to
//! it, and retires finished sessions: the record is persisted, a review's
//! queued follow-ups go out to the original reporter, and the moderation
//! channel gets a completion notice. Guild traffic runs through the
//! classification gate and can file automated reports.

use crate::chat::{ChatError, MessageSnapshot, UserId};
use crate::classifier::ClassifierError;
use crate::context::AppContext;
use crate::flow::{
    keyword, GuidedFlow, ReportFlow, ReviewFlow, START_REPORT_KEYWORD, START_REVIEW_ALT_KEYWORD,
    START_REVIEW_KEYWORD,
};
use crate::records::store::StoreError;
use crate::records::{ReasonCategory, ReasonDetail, RecordStatus, ReportRecord, ReportSource};
use dashmap::DashMap;
use std::sync::Arc;

/// Router operation errors.
#[derive(Debug)]
pub enum RouterError {
    Chat(ChatError),
    Store(StoreError),
    Classifier(ClassifierError),
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::Chat(e) => write!(f, "Chat error: {}", e),
            RouterError::Store(e) => write!(f, "Store error: {}", e),
            RouterError::Classifier(e) => write!(f, "Classifier error: {}", e),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<ChatError> for RouterError {
    fn from(e: ChatError) -> Self {
        RouterError::Chat(e)
    }
}

impl From<StoreError> for RouterError {
    fn from(e: StoreError) -> Self {
        RouterError::Store(e)
    }
}

impl From<ClassifierError> for RouterError {
    fn from(e: ClassifierError) -> Self {
        RouterError::Classifier(e)
    }
}

/// One user's active flow.
enum Session {
    Report(ReportFlow),
    Review(ReviewFlow),
}

impl Session {
    async fn handle_message(&mut self, input: &str) -> Vec<String> {
        match self {
            Session::Report(flow) => flow.handle_message(input).await,
            Session::Review(flow) => flow.handle_message(input).await,
        }
    }

    fn is_complete(&self) -> bool {
        match self {
            Session::Report(flow) => flow.is_complete(),
            Session::Review(flow) => flow.is_complete(),
        }
    }
}

/// Dispatches inbound traffic to per-user flows.
pub struct SessionRouter {
    ctx: Arc<AppContext>,
    /// User Id -> active flow; at most one per user
    sessions: DashMap<UserId, Session>,
}

impl SessionRouter {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            sessions: DashMap::new(),
        }
    }

    /// Number of flows currently in progress.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// The static command listing sent to anyone DMing us outside a flow.
    fn command_help(&self, author_id: UserId) -> String {
        let mut reply = String::from(
            "Use the `report` command to begin the reporting process.\n\
             Use the `cancel` command to cancel the report process.\n",
        );
        if self.ctx.is_moderator(author_id) {
            reply.push_str("Use the `review` command to begin the moderator review process.\n");
        }
        reply.push_str(
            "If you are a mod and haven't registered yourself, please ask an administrator \
             to add your ID.\n",
        );
        reply.push_str(&format!("Your user ID is: {}\n", author_id));
        reply
    }

    /// Handle one direct message from `author_id` arriving on `channel_id`.
    pub async fn handle_dm(
        &self,
        author_id: UserId,
        channel_id: u64,
        content: &str,
    ) -> Result<(), RouterError> {
        if !self.sessions.contains_key(&author_id) {
            if keyword(content, START_REVIEW_KEYWORD) || keyword(content, START_REVIEW_ALT_KEYWORD)
            {
                if !self.ctx.is_moderator(author_id) {
                    self.ctx
                        .host
                        .send(
                            channel_id,
                            "Only recognized moderators can start a review. Say `help` to see \
                             what you can do.",
                        )
                        .await?;
                    return Ok(());
                }
                let review_id = self.ctx.allocator.next_review_id();
                log::info!("User {} started review {}", author_id, review_id);
                self.sessions.insert(
                    author_id,
                    Session::Review(ReviewFlow::new(review_id, author_id, self.ctx.clone())),
                );
            } else if keyword(content, START_REPORT_KEYWORD) {
                let report_id = self.ctx.allocator.next_report_id();
                log::info!("User {} started report {}", author_id, report_id);
                self.sessions.insert(
                    author_id,
                    Session::Report(ReportFlow::new(
                        report_id,
                        author_id,
                        channel_id,
                        self.ctx.host.clone(),
                    )),
                );
            } else {
                // Not in a flow and not a start command: list what the
                // sender can do.
                self.ctx
                    .host
                    .send(channel_id, &self.command_help(author_id))
                    .await?;
                return Ok(());
            }
        }

        // Take the session out while it processes this message; a user's own
        // conversation is serialized by the single event stream.
        let mut session = match self.sessions.remove(&author_id) {
            Some((_, session)) => session,
            None => return Ok(()),
        };

        let replies = session.handle_message(content).await;
        for line in replies {
            self.ctx.host.send(channel_id, &line).await?;
        }

        if session.is_complete() {
            self.retire(session).await?;
        } else {
            self.sessions.insert(author_id, session);
        }
        Ok(())
    }

    /// Persist a finished flow, deliver what it queued, and announce it.
    async fn retire(&self, session: Session) -> Result<(), RouterError> {
        match session {
            Session::Report(flow) => {
                let record = flow.into_record();
                self.ctx.store.save_report(&record).await?;
                self.checkpoint_counters();
                let notice = format!("---- New report! ----\n{}", record);
                self.announce(record.target.map(|t| t.guild_id), &notice).await;
            }
            Session::Review(flow) => {
                let (record, report) = flow.into_parts();
                self.ctx.store.save_review(&record).await?;
                self.checkpoint_counters();

                if record.status == RecordStatus::Complete {
                    self.deliver_followups(&record.followups, record.victim_resources.as_deref(),
                        report.as_ref().and_then(|r| r.author_channel))
                        .await;
                }

                let notice = format!("---- Review closed ----\n{}", record);
                self.announce(record.guild_id, &notice).await;
            }
        }
        Ok(())
    }

    /// Send the queued reporter updates, resources note last.
    async fn deliver_followups(
        &self,
        followups: &[String],
        victim_resources: Option<&str>,
        author_channel: Option<u64>,
    ) {
        let channel = match author_channel {
            Some(channel) => channel,
            None => {
                if !followups.is_empty() {
                    log::warn!("No reporter channel to deliver {} follow-up(s)", followups.len());
                }
                return;
            }
        };
        for line in followups {
            if let Err(e) = self.ctx.host.send(channel, line).await {
                log::warn!("Follow-up delivery failed: {}", e);
            }
        }
        if let Some(resources) = victim_resources {
            if let Err(e) = self.ctx.host.send(channel, resources).await {
                log::warn!("Victim resources delivery failed: {}", e);
            }
        }
    }

    /// Best-effort completion notice to a guild's moderation channel.
    async fn announce(&self, guild_id: Option<u64>, notice: &str) {
        match guild_id.and_then(|g| self.ctx.mod_channel(g)) {
            Some(channel) => {
                if let Err(e) = self.ctx.host.send(channel, notice).await {
                    log::warn!("Completion notice failed: {}", e);
                }
            }
            None => log::info!("No guild known for finished record; skipping notice"),
        }
    }

    fn checkpoint_counters(&self) {
        if let Err(e) = self.ctx.allocator.flush() {
            log::warn!("Counter checkpoint failed: {}", e);
        }
    }

    /// Handle one message in a guild channel.
    ///
    /// Messages outside a guild's watched channel are ignored. Watched
    /// traffic is forwarded to the moderation channel with the gate's
    /// verdict; an escalation also files an automated report so moderators
    /// can pull it up by number. A classifier failure is returned to the
    /// caller and never passes a message silently.
    pub async fn handle_guild_message(&self, message: &MessageSnapshot) -> Result<(), RouterError> {
        let guild_id = message.reference.guild_id;
        if self.ctx.watch_channel(guild_id) != Some(message.reference.channel_id) {
            return Ok(());
        }
        let mod_channel = match self.ctx.mod_channel(guild_id) {
            Some(channel) => channel,
            None => return Ok(()),
        };

        self.ctx
            .host
            .send(
                mod_channel,
                &format!(
                    "Forwarded message:\n{}: \"{}\"",
                    message.author_name, message.content
                ),
            )
            .await?;

        let evaluation = self
            .ctx
            .gate
            .evaluate(message.author_id, &message.content)
            .await?;
        self.ctx.host.send(mod_channel, &evaluation.display).await?;

        if evaluation.escalate {
            let report_id = self.ctx.allocator.next_report_id();
            let mut record =
                ReportRecord::new(report_id, self.ctx.bot_user_id, None, ReportSource::AutoFlagged);
            record.target = Some(message.reference);
            record.message_excerpt = Some(format!(
                "```{}: {}```",
                message.author_name,
                message.content.replace("```", "``")
            ));
            record.reason = Some(ReasonCategory::Harassment);
            record.reason_detail = Some(ReasonDetail::SensitiveInfoLeak);
            record.comments = Some(evaluation.display.clone());
            record.status = RecordStatus::Complete;

            self.ctx.store.save_report(&record).await?;
            self.checkpoint_counters();
            log::info!("Escalated message {} as report {}", message.reference.link(), report_id);
            self.ctx
                .host
                .send(mod_channel, &format!("---- New report! ----\n{}", record))
                .await?;
        }
        Ok(())
    }
}
