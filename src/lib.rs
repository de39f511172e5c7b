//! Moderation report/review workflow engine.
//!
//! Users file reports about chat messages through a guided DM conversation,
//! automated classification can file reports on its own, and moderators work
//! through a separate guided conversation to record a disposition. The chat
//! platform and the classification oracle sit behind capability traits so the
//! engine can run against a real connection, the local console harness, or
//! test fixtures.

pub mod app_config;
pub mod chat;
pub mod classifier;
pub mod context;
pub mod flow;
pub mod gate;
pub mod history;
pub mod records;
pub mod router;
