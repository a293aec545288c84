//! Poll data model.

use serde::{Deserialize, Serialize};

/// Rank base for closed polls. Exceeds any plausible end time in ms since
/// the epoch, so every closed rank sorts after every open rank.
pub(crate) const CLOSED_RANK_BASE: i64 = 1_000_000_000_000_000;

/// A named, time-bounded choice among fixed options.
///
/// Immutable once stored. `end_time` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    /// Unique poll name, also the lookup key.
    pub name: String,
    /// Closing instant, ms since the Unix epoch.
    pub end_time: i64,
    /// Choices in the order the creator gave them. At least two.
    pub options: Vec<String>,
}

impl Poll {
    /// Whether the poll is still open at `now_ms`. The closing instant
    /// itself counts as open.
    pub fn is_open(&self, now_ms: i64) -> bool {
        now_ms <= self.end_time
    }

    /// Sort key merging open/closed ordering into one ascending comparison:
    /// open polls rank by end time (closing soonest first), closed polls by
    /// `CLOSED_RANK_BASE - end_time` (most recently closed first).
    pub(crate) fn rank(&self, now_ms: i64) -> i64 {
        if self.is_open(now_ms) {
            self.end_time
        } else {
            CLOSED_RANK_BASE - self.end_time
        }
    }
}
