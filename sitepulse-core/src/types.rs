//! Response items shared by the source adapters and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// LIMIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Upper bound on the number of items a route emits.
///
/// Configured as a signed integer where zero or a negative value means
/// "no limit".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit(Option<usize>);

impl Limit {
    /// No upper bound.
    pub const UNLIMITED: Limit = Limit(None);

    /// Interprets a configured value; `<= 0` is unlimited.
    pub fn from_signed(value: i64) -> Self {
        if value <= 0 {
            Self::UNLIMITED
        } else {
            Limit(Some(usize::try_from(value).unwrap_or(usize::MAX)))
        }
    }

    /// Returns the bound, if any.
    pub fn get(&self) -> Option<usize> {
        self.0
    }

    /// Returns true if `emitted` items still leave room for another.
    pub fn allows(&self, emitted: usize) -> bool {
        self.0.map_or(true, |max| emitted < max)
    }

    /// Keeps at most the first `limit` items.
    pub fn truncate<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if let Some(max) = self.0 {
            items.truncate(max);
        }
        items
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIVITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Daily activity over a window of days.
///
/// `day[0]` is today, `day[1]` yesterday, and so on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCount {
    /// Sum of all counted days.
    pub total: i64,
    /// Largest single-day count, `-1` when nothing was counted.
    pub max: i64,
    /// Per-day counts, newest first.
    pub day: Vec<i64>,
}

impl ActivityCount {
    /// A zeroed tally for a window of `days`.
    pub fn empty(days: usize) -> Self {
        Self {
            total: 0,
            max: -1,
            day: vec![0; days],
        }
    }

    /// Builds a tally from an already newest-first series.
    pub fn from_increments(day: Vec<i64>) -> Self {
        let total = day.iter().sum();
        let max = day.iter().copied().max().unwrap_or(-1);
        Self { total, max, day }
    }

    /// Records `count` for the day `days_ago` before today.
    ///
    /// Returns false if the day falls outside the window.
    pub fn record(&mut self, days_ago: usize, count: i64) -> bool {
        let Some(slot) = self.day.get_mut(days_ago) else {
            return false;
        };
        *slot = count;
        self.total += count;
        self.max = self.max.max(count);
        true
    }
}

/// Body of the combined activity route.
///
/// Serialized as `{"days": .., "github": .., "misskey": ..}` in that order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityResponse {
    /// Window length in days.
    pub days: usize,
    /// GitHub contribution tally.
    pub github: ActivityCount,
    /// Misskey note tally.
    pub misskey: ActivityCount,
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEED ITEMS
// ═══════════════════════════════════════════════════════════════════════════════

/// A blog post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogFeedItem {
    /// Cover image URL
    pub cover: String,
    /// Publication time
    pub date: Option<DateTime<Utc>>,
    /// Post title, never empty
    pub title: String,
    /// Category terms
    pub categories: Vec<String>,
    /// Post URL
    pub link: String,
}

/// An entry of the GitHub public activity feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubFeedItem {
    /// Event time
    pub date: Option<DateTime<Utc>>,
    /// Event summary, e.g. "octocat starred rust-lang/rust"
    pub title: String,
    /// Event URL
    pub link: String,
}

/// A Misskey note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MisskeyNoteItem {
    /// Creation time
    pub date: DateTime<Utc>,
    /// Note body, absent for file-only notes
    pub text: Option<String>,
    /// Content warning
    pub cw: Option<String>,
    /// Permalink on the instance
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, None ; "zero is unlimited")]
    #[test_case(-3, None ; "negative is unlimited")]
    #[test_case(2, Some(2) ; "positive bound")]
    fn test_limit_from_signed(value: i64, expected: Option<usize>) {
        assert_eq!(Limit::from_signed(value).get(), expected);
    }

    #[test]
    fn test_limit_truncate() {
        let items = vec!["a", "b", "c", "d", "e"];
        assert_eq!(Limit::from_signed(2).truncate(items.clone()), vec!["a", "b"]);
        assert_eq!(Limit::from_signed(0).truncate(items.clone()), items);
        assert_eq!(Limit::from_signed(9).truncate(items.clone()), items);
    }

    #[test]
    fn test_limit_allows() {
        let limit = Limit::from_signed(2);
        assert!(limit.allows(0));
        assert!(limit.allows(1));
        assert!(!limit.allows(2));
        assert!(Limit::UNLIMITED.allows(usize::MAX - 1));
    }

    #[test]
    fn test_activity_record_window() {
        let mut count = ActivityCount::empty(3);
        assert!(count.record(0, 4));
        assert!(count.record(2, 6));
        assert!(!count.record(3, 100));

        assert_eq!(count.day, vec![4, 0, 6]);
        assert_eq!(count.total, 10);
        assert_eq!(count.max, 6);
    }

    #[test]
    fn test_activity_from_increments() {
        let count = ActivityCount::from_increments(vec![1, 5, 0, 2]);
        assert_eq!(count.total, 8);
        assert_eq!(count.max, 5);

        let empty = ActivityCount::from_increments(Vec::new());
        assert_eq!(empty.total, 0);
        assert_eq!(empty.max, -1);
    }

    #[test]
    fn test_activity_response_field_order() {
        let response = ActivityResponse {
            days: 1,
            github: ActivityCount::empty(1),
            misskey: ActivityCount::empty(1),
        };
        let json = serde_json::to_string(&response).unwrap();
        let days = json.find("\"days\"").unwrap();
        let github = json.find("\"github\"").unwrap();
        let misskey = json.find("\"misskey\"").unwrap();
        assert!(days < github && github < misskey);
    }
}
