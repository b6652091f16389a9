//! Grouping of index entries for the session list

use super::types::IndexEntry;
use chrono::{DateTime, Duration, TimeZone};

/// Lookback window of the "Previous 7 Days" group
pub const LOOKBACK_DAYS: i64 = 7;

/// Index entries grouped by age, each group in index order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidebarBuckets {
    /// Updated on the current calendar day
    pub today: Vec<IndexEntry>,
    /// Updated on the previous calendar day
    pub yesterday: Vec<IndexEntry>,
    /// Older than yesterday but newer than the lookback window
    pub previous_seven_days: Vec<IndexEntry>,
    /// Entries that fall in no group
    pub hidden: usize,
}

impl SidebarBuckets {
    /// True when no group has anything to show
    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.yesterday.is_empty() && self.previous_seven_days.is_empty()
    }
}

/// Split `entries` into Today / Yesterday / Previous 7 Days relative to `now`
///
/// Today and Yesterday compare calendar days in `now`'s time zone. Entries
/// older than the lookback window are not shown in any group and are only
/// counted in `hidden`.
pub fn bucket_index<Tz: TimeZone>(entries: &[IndexEntry], now: DateTime<Tz>) -> SidebarBuckets {
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);
    let cutoff = now.clone() - Duration::days(LOOKBACK_DAYS);

    let mut buckets = SidebarBuckets::default();
    for entry in entries {
        let local = entry.timestamp.with_timezone(&tz);
        let day = local.date_naive();
        if day == today {
            buckets.today.push(entry.clone());
        } else if day == yesterday {
            buckets.yesterday.push(entry.clone());
        } else if day < yesterday && local > cutoff {
            buckets.previous_seven_days.push(entry.clone());
        } else {
            buckets.hidden += 1;
        }
    }
    buckets
}
