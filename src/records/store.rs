//! Durable record storage.
//!
//! One JSON document per record (`report_<id>.json`, `review_<id>.json`)
//! under the configured data directory. Records hold ids only; loading
//! re-resolves the message reference against the current connection, and a
//! message that has since disappeared degrades to an unresolved reference
//! rather than failing the load.

use super::{ReportRecord, ReviewRecord};
use crate::chat::{resolve_message, ChannelId, ChatHost, MessageSnapshot};
use std::path::{Path, PathBuf};

/// Record store operation errors.
#[derive(Debug)]
pub enum StoreError {
    /// No such record (also covers an unreadable record on disk)
    NotFound(u64),
    /// I/O error
    Io(std::io::Error),
    /// Serialization error on save
    Serialize(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Record {} not found", id),
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
            StoreError::Serialize(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialize(e)
    }
}

/// A report reconstructed from disk, with its references re-resolved.
#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub record: ReportRecord,
    /// The live message, when it still exists
    pub message: Option<MessageSnapshot>,
    /// The filer's notify channel, when it is still reachable
    pub author_channel: Option<ChannelId>,
}

/// A review reconstructed from disk, with its report embedded.
#[derive(Debug, Clone)]
pub struct LoadedReview {
    pub record: ReviewRecord,
    /// Absent when the referenced report no longer loads
    pub report: Option<LoadedReport>,
}

/// File-backed store for report and review records.
pub struct RecordStore {
    base_path: PathBuf,
}

impl RecordStore {
    /// Create a store rooted at `base_path`, creating the directory if
    /// needed.
    pub fn new(base_path: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&base_path)?;
        log::info!("RecordStore initialized at {:?}", base_path);
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn report_path(&self, report_id: u64) -> PathBuf {
        self.base_path.join(format!("report_{}.json", report_id))
    }

    fn review_path(&self, review_id: u64) -> PathBuf {
        self.base_path.join(format!("review_{}.json", review_id))
    }

    /// Persist one report record.
    pub async fn save_report(&self, record: &ReportRecord) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(self.report_path(record.report_id), json).await?;
        log::debug!("Saved report {}", record.report_id);
        Ok(())
    }

    /// Persist one review record.
    pub async fn save_review(&self, record: &ReviewRecord) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(self.review_path(record.review_id), json).await?;
        log::debug!("Saved review {}", record.review_id);
        Ok(())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &Path,
        id: u64,
    ) -> Result<T, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id))
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(record),
            Err(e) => {
                log::warn!("Record file {:?} is unreadable: {}", path, e);
                Err(StoreError::NotFound(id))
            }
        }
    }

    /// Load a report and re-resolve its references against `host`.
    ///
    /// A guild, channel or message that no longer exists leaves `message`
    /// unset; only a missing or unreadable file is an error.
    pub async fn load_report(
        &self,
        report_id: u64,
        host: &dyn ChatHost,
    ) -> Result<LoadedReport, StoreError> {
        let record: ReportRecord = self.read_json(&self.report_path(report_id), report_id).await?;

        let message = match record.target {
            Some(reference) => resolve_message(host, reference).await.into_snapshot(),
            None => None,
        };

        let author_channel = match record.author_channel_id {
            Some(channel_id) => {
                if host.channel_exists(channel_id).await {
                    Some(channel_id)
                } else {
                    None
                }
            }
            None => None,
        };

        Ok(LoadedReport {
            record,
            message,
            author_channel,
        })
    }

    /// Load a review, embedding its referenced report.
    pub async fn load_review(
        &self,
        review_id: u64,
        host: &dyn ChatHost,
    ) -> Result<LoadedReview, StoreError> {
        let record: ReviewRecord = self.read_json(&self.review_path(review_id), review_id).await?;

        let report = match record.report_id {
            Some(report_id) => match self.load_report(report_id, host).await {
                Ok(report) => Some(report),
                Err(StoreError::NotFound(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };

        Ok(LoadedReview { record, report })
    }
}
