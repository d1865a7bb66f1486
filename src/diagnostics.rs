use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// How many failures the journal keeps per user.
pub const JOURNAL_CAPACITY: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub user_id: Uuid,
    pub context: String,
    pub error: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

/// Bounded in-memory record of recent chat failures per user, oldest
/// dropped first.
#[derive(Debug, Default)]
pub struct ErrorJournal {
    entries: Mutex<HashMap<Uuid, VecDeque<ErrorEntry>>>,
}

impl ErrorJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, user_id: Uuid, context: &str, error: &anyhow::Error) {
        tracing::error!(%user_id, context, error = %format!("{error:#}"), "chat failure");
        let entry = ErrorEntry {
            user_id,
            context: context.to_string(),
            error: format!("{error:#}"),
            time: OffsetDateTime::now_utc(),
        };
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mine = entries.entry(user_id).or_default();
        if mine.len() == JOURNAL_CAPACITY {
            mine.pop_front();
        }
        mine.push_back(entry);
    }

    /// Entries belonging to `user_id`, oldest first.
    pub fn for_user(&self, user_id: Uuid) -> Vec<ErrorEntry> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .get(&user_id)
            .map(|mine| mine.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_latest_entries() {
        let journal = ErrorJournal::new();
        let user = Uuid::new_v4();
        for i in 0..(JOURNAL_CAPACITY + 3) {
            journal.record(user, "analyzeMeal", &anyhow::anyhow!("failure {i}"));
        }
        let entries = journal.for_user(user);
        assert_eq!(entries.len(), JOURNAL_CAPACITY);
        assert_eq!(entries[0].error, "failure 3");
        assert_eq!(entries.last().unwrap().error, format!("failure {}", JOURNAL_CAPACITY + 2));
    }

    #[test]
    fn filters_by_user() {
        let journal = ErrorJournal::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        journal.record(a, "getResponse", &anyhow::anyhow!("boom"));
        journal.record(b, "processImage", &anyhow::anyhow!("bang"));
        let mine = journal.for_user(a);
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].context, "getResponse");
    }

    #[test]
    fn one_user_failures_do_not_evict_another() {
        let journal = ErrorJournal::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        journal.record(a, "analyzeMeal", &anyhow::anyhow!("first"));
        for i in 0..JOURNAL_CAPACITY {
            journal.record(b, "getResponse", &anyhow::anyhow!("noise {i}"));
        }
        let mine = journal.for_user(a);
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].error, "first");
        assert_eq!(journal.for_user(b).len(), JOURNAL_CAPACITY);
    }
}
