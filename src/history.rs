//! Per-user decaying classification memory.
//!
//! Each flagged user carries the strongest recent flag level and a countdown
//! of remaining messages. Every evaluated message from that user burns one
//! turn; the entry disappears when the countdown runs out. A fresh flag never
//! downgrades a live entry: equal or stronger levels overwrite and reset the
//! countdown.

use crate::chat::UserId;
use crate::classifier::HistoryLevel;
use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    level: HistoryLevel,
    remaining: u32,
}

/// Tracks `(level, remaining turns)` per user.
#[derive(Default)]
pub struct HistoryTracker {
    entries: DashMap<UserId, HistoryEntry>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Burn one turn of the user's entry and return the level to use as
    /// context for this evaluation.
    ///
    /// A countdown that reaches zero deletes the entry and yields
    /// [`HistoryLevel::None`] for this call.
    pub fn tick(&self, user_id: UserId) -> HistoryLevel {
        if let Some(mut entry) = self.entries.get_mut(&user_id) {
            entry.remaining -= 1;
            if entry.remaining > 0 {
                return entry.level;
            }
        } else {
            return HistoryLevel::None;
        }
        self.entries.remove(&user_id);
        HistoryLevel::None
    }

    /// Record a fresh flag for the user.
    ///
    /// Overwrites only when `level` is at least the live level; an equal
    /// level still resets the countdown. [`HistoryLevel::None`] is a no-op.
    pub fn record(&self, user_id: UserId, level: HistoryLevel) {
        let ttl = match level.ttl() {
            Some(ttl) => ttl,
            None => return,
        };
        match self.entries.entry(user_id) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if level >= occupied.get().level {
                    occupied.insert(HistoryEntry {
                        level,
                        remaining: ttl,
                    });
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(HistoryEntry {
                    level,
                    remaining: ttl,
                });
            }
        }
    }

    /// The user's live `(level, remaining turns)`, if any. Does not burn a
    /// turn; used for display.
    pub fn peek(&self, user_id: UserId) -> Option<(HistoryLevel, u32)> {
        self.entries
            .get(&user_id)
            .map(|entry| (entry.level, entry.remaining))
    }
}
