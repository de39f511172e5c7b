//! Report and review records.
//!
//! Plain data records, persisted as one JSON document each. They hold only
//! resolvable identifiers, never live platform handles, so a record written
//! in one session can be reloaded and re-resolved in another.

pub mod counter;
pub mod store;

use crate::chat::{ChannelId, GuildId, MessageRef, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle shared by reports and reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    InProgress,
    Complete,
    Cancelled,
}

impl RecordStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RecordStatus::InProgress => "In Progress",
            RecordStatus::Complete => "Complete",
            RecordStatus::Cancelled => "Cancelled",
        }
    }
}

/// Who created a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportSource {
    UserFiled,
    AutoFlagged,
}

impl ReportSource {
    pub fn label(&self) -> &'static str {
        match self {
            ReportSource::UserFiled => "User Report",
            ReportSource::AutoFlagged => "Automated Flag",
        }
    }
}

/// Whether the filer is reporting on their own behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectWho {
    Myself,
    SomeoneElse,
}

impl SubjectWho {
    pub fn label(&self) -> &'static str {
        match self {
            SubjectWho::Myself => "Myself",
            SubjectWho::SomeoneElse => "Someone Else",
        }
    }
}

/// Top level of the reason taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCategory {
    Harassment,
    DangerousInfo,
    MisleadingInfo,
    ExplicitContent,
    Other,
}

/// Second level of the reason taxonomy, keyed by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonDetail {
    SensitiveInfoLeak,
    Bullying,
    HateSpeech,
    SelfHarm,
    Threats,
    Fraud,
    Impersonation,
    Spam,
    ChildAbuse,
    Pornography,
    /// Free-text explanation for the Other category
    Other(String),
}

impl ReasonDetail {
    pub fn label(&self) -> &str {
        match self {
            ReasonDetail::SensitiveInfoLeak => "Leaking Sensitive Information",
            ReasonDetail::Bullying => "Bullying",
            ReasonDetail::HateSpeech => "Hate Speech",
            ReasonDetail::SelfHarm => "Suicide/Self-Harm",
            ReasonDetail::Threats => "Threats",
            ReasonDetail::Fraud => "Fraud",
            ReasonDetail::Impersonation => "Impersonation",
            ReasonDetail::Spam => "Spam",
            ReasonDetail::ChildAbuse => "Child Abuse",
            ReasonDetail::Pornography => "Pornography",
            ReasonDetail::Other(text) => text,
        }
    }
}

/// One entry of a category's subtype menu.
pub struct MenuEntry {
    /// The letter users type to pick this entry
    pub key: &'static str,
    pub label: &'static str,
    pub detail: ReasonDetail,
}

static HARASSMENT_MENU: &[MenuEntry] = &[
    MenuEntry {
        key: "l",
        label: "leaking sensitive information",
        detail: ReasonDetail::SensitiveInfoLeak,
    },
    MenuEntry {
        key: "b",
        label: "bullying",
        detail: ReasonDetail::Bullying,
    },
    MenuEntry {
        key: "h",
        label: "hate speech",
        detail: ReasonDetail::HateSpeech,
    },
];

static DANGEROUS_INFO_MENU: &[MenuEntry] = &[
    MenuEntry {
        key: "s",
        label: "suicide/self-harm content",
        detail: ReasonDetail::SelfHarm,
    },
    MenuEntry {
        key: "t",
        label: "threats of violence",
        detail: ReasonDetail::Threats,
    },
];

static MISLEADING_INFO_MENU: &[MenuEntry] = &[
    MenuEntry {
        key: "f",
        label: "fraud",
        detail: ReasonDetail::Fraud,
    },
    MenuEntry {
        key: "i",
        label: "impersonation",
        detail: ReasonDetail::Impersonation,
    },
    MenuEntry {
        key: "s",
        label: "spam",
        detail: ReasonDetail::Spam,
    },
];

static EXPLICIT_CONTENT_MENU: &[MenuEntry] = &[
    MenuEntry {
        key: "c",
        label: "child abuse or harassment",
        detail: ReasonDetail::ChildAbuse,
    },
    MenuEntry {
        key: "p",
        label: "pornography",
        detail: ReasonDetail::Pornography,
    },
];

impl ReasonCategory {
    /// The keyword users type to pick this category.
    pub fn keyword(&self) -> &'static str {
        match self {
            ReasonCategory::Harassment => "harass",
            ReasonCategory::DangerousInfo => "dangerous",
            ReasonCategory::MisleadingInfo => "mislead",
            ReasonCategory::ExplicitContent => "explicit",
            ReasonCategory::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReasonCategory::Harassment => "Harassment",
            ReasonCategory::DangerousInfo => "Dangerous Information",
            ReasonCategory::MisleadingInfo => "Misleading Information",
            ReasonCategory::ExplicitContent => "Explicit Content",
            ReasonCategory::Other => "Other",
        }
    }

    pub const ALL: [ReasonCategory; 5] = [
        ReasonCategory::Harassment,
        ReasonCategory::DangerousInfo,
        ReasonCategory::MisleadingInfo,
        ReasonCategory::ExplicitContent,
        ReasonCategory::Other,
    ];

    /// The fixed subtype menu for this category; `None` for Other, which
    /// takes free text instead.
    pub fn menu(&self) -> Option<&'static [MenuEntry]> {
        match self {
            ReasonCategory::Harassment => Some(HARASSMENT_MENU),
            ReasonCategory::DangerousInfo => Some(DANGEROUS_INFO_MENU),
            ReasonCategory::MisleadingInfo => Some(MISLEADING_INFO_MENU),
            ReasonCategory::ExplicitContent => Some(EXPLICIT_CONTENT_MENU),
            ReasonCategory::Other => None,
        }
    }

    /// Parse a subtype selection for this category.
    ///
    /// Menu keys match case-insensitively on the input prefix, so both `b`
    /// and `bullying` select bullying. Other accepts any non-empty text.
    pub fn parse_detail(&self, input: &str) -> Option<ReasonDetail> {
        let trimmed = input.trim();
        match self.menu() {
            Some(menu) => {
                let lowered = trimmed.to_lowercase();
                menu.iter()
                    .find(|entry| lowered.starts_with(entry.key))
                    .map(|entry| entry.detail.clone())
            }
            None => {
                if trimmed.is_empty() {
                    None
                } else {
                    Some(ReasonDetail::Other(trimmed.to_string()))
                }
            }
        }
    }
}

/// One user-filed or auto-generated complaint about a message.
///
/// Immutable once `status` leaves `InProgress`, save for transient
/// re-resolution of the message reference at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub report_id: u64,
    pub author_id: UserId,
    /// Where to send the filer updates; absent for automated flags
    pub author_channel_id: Option<ChannelId>,
    pub target: Option<MessageRef>,
    /// Text captured at filing time, shown even after the message is deleted
    pub message_excerpt: Option<String>,
    pub subject: Option<SubjectWho>,
    pub has_account: Option<bool>,
    pub other_username: Option<String>,
    pub reason: Option<ReasonCategory>,
    pub reason_detail: Option<ReasonDetail>,
    pub comments: Option<String>,
    pub source: ReportSource,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn new(
        report_id: u64,
        author_id: UserId,
        author_channel_id: Option<ChannelId>,
        source: ReportSource,
    ) -> Self {
        Self {
            report_id,
            author_id,
            author_channel_id,
            target: None,
            message_excerpt: None,
            subject: None,
            has_account: None,
            other_username: None,
            reason: None,
            reason_detail: None,
            comments: None,
            source,
            status: RecordStatus::InProgress,
            created_at: Utc::now(),
        }
    }
}

const RULE: &str = "--------------------------------------------------\n";

impl std::fmt::Display for ReportRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", RULE)?;
        writeln!(f, "Report Number: {} ({})", self.report_id, self.source.label())?;
        writeln!(f, "Report Status: {}", self.status.label())?;
        writeln!(f, "Author ID: {}", self.author_id)?;
        write!(f, "{}", RULE)?;
        writeln!(
            f,
            "Message: {}",
            self.message_excerpt.as_deref().unwrap_or("`Awaiting`")
        )?;
        writeln!(
            f,
            "Person Involved: `{}`",
            self.subject.map(|s| s.label()).unwrap_or("Awaiting")
        )?;
        writeln!(
            f,
            "Other Username: `{}`",
            self.other_username.as_deref().unwrap_or("N/A")
        )?;
        write!(f, "{}", RULE)?;
        writeln!(
            f,
            "Reason For Report: `{}`",
            self.reason.map(|r| r.label()).unwrap_or("Awaiting")
        )?;
        writeln!(
            f,
            "Type: `{}`",
            self.reason_detail
                .as_ref()
                .map(|d| d.label())
                .unwrap_or("Awaiting")
        )?;
        writeln!(
            f,
            "Additional Comments: `{}`",
            self.comments.as_deref().unwrap_or("N/A")
        )?;
        write!(f, "{}", RULE)
    }
}

/// A moderator's assessment of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credibility {
    Unknown,
    Credible,
    NotCredible,
}

impl Credibility {
    pub fn label(&self) -> &'static str {
        match self {
            Credibility::Unknown => "Unknown",
            Credibility::Credible => "Credible",
            Credibility::NotCredible => "Not Credible",
        }
    }
}

/// Whether the moderator judged anyone to be in immediate danger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DangerAssessment {
    Unset,
    Immediate,
    NotImmediate,
}

/// One recorded disposition action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionAction {
    NoAction,
    RemovePost,
    BanOffender,
    EngageLawEnforcement,
}

impl DecisionAction {
    /// The keyword moderators type to pick this action.
    pub fn keyword(&self) -> &'static str {
        match self {
            DecisionAction::NoAction => "no action",
            DecisionAction::RemovePost => "remove post",
            DecisionAction::BanOffender => "offender ban",
            DecisionAction::EngageLawEnforcement => "law enforcement",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DecisionAction::NoAction => "No Action",
            DecisionAction::RemovePost => "Remove Post",
            DecisionAction::BanOffender => "Ban Offender",
            DecisionAction::EngageLawEnforcement => "Engage Law Enforcement",
        }
    }
}

/// One moderator's disposition of a report.
///
/// Numbered independently of reports. Reaches `Complete` only once a
/// decision is recorded or credibility resolved false (which short-circuits
/// to no-action).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review_id: u64,
    pub moderator_id: UserId,
    pub report_id: Option<u64>,
    pub guild_id: Option<GuildId>,
    pub credibility: Credibility,
    pub danger: DangerAssessment,
    pub decision: Vec<DecisionAction>,
    pub status: RecordStatus,
    /// Updates queued for the original reporter, delivered on completion
    pub followups: Vec<String>,
    pub victim_resources: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReviewRecord {
    pub fn new(review_id: u64, moderator_id: UserId) -> Self {
        Self {
            review_id,
            moderator_id,
            report_id: None,
            guild_id: None,
            credibility: Credibility::Unknown,
            danger: DangerAssessment::Unset,
            decision: Vec::new(),
            status: RecordStatus::InProgress,
            followups: Vec::new(),
            victim_resources: None,
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for ReviewRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", RULE)?;
        writeln!(f, "Mod Review Number: {}", self.review_id)?;
        writeln!(f, "Review Status: {}", self.status.label())?;
        writeln!(f, "Mod ID: {}", self.moderator_id)?;
        match self.report_id {
            Some(id) => writeln!(f, "Report Number: {}", id)?,
            None => writeln!(f, "Report Number: `Awaiting`")?,
        }
        writeln!(f, "Credibility: `{}`", self.credibility.label())?;
        if !self.decision.is_empty() {
            let actions: Vec<&str> = self.decision.iter().map(|d| d.label()).collect();
            writeln!(f, "Decision: `{}`", actions.join(", "))?;
        }
        write!(f, "{}", RULE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detail_by_key_and_word() {
        assert_eq!(
            ReasonCategory::Harassment.parse_detail("b"),
            Some(ReasonDetail::Bullying)
        );
        assert_eq!(
            ReasonCategory::Harassment.parse_detail("Bullying"),
            Some(ReasonDetail::Bullying)
        );
        assert_eq!(ReasonCategory::Harassment.parse_detail("x"), None);
    }

    #[test]
    fn test_parse_detail_other_takes_free_text() {
        assert_eq!(
            ReasonCategory::Other.parse_detail("  posting my address  "),
            Some(ReasonDetail::Other("posting my address".to_string()))
        );
        assert_eq!(ReasonCategory::Other.parse_detail("   "), None);
    }

    #[test]
    fn test_menus_cover_all_categories() {
        for category in ReasonCategory::ALL {
            match category {
                ReasonCategory::Other => assert!(category.menu().is_none()),
                _ => assert!(!category.menu().unwrap().is_empty()),
            }
        }
    }

    #[test]
    fn test_report_render_shows_awaiting_fields() {
        let record = ReportRecord::new(7, 42, Some(9), ReportSource::UserFiled);
        let rendered = record.to_string();
        assert!(rendered.contains("Report Number: 7"));
        assert!(rendered.contains("Person Involved: `Awaiting`"));
        assert!(rendered.contains("Other Username: `N/A`"));
    }

    #[test]
    fn test_review_render_includes_decision() {
        let mut record = ReviewRecord::new(3, 1000);
        record.report_id = Some(7);
        record.decision.push(DecisionAction::BanOffender);
        record.decision.push(DecisionAction::EngageLawEnforcement);
        let rendered = record.to_string();
        assert!(rendered.contains("Mod Review Number: 3"));
        assert!(rendered.contains("Ban Offender, Engage Law Enforcement"));
    }
}
