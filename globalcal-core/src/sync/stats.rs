use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// What a sync pass did to one projected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    Create,
    Update,
    Delete,
}

impl SyncAction {
    pub fn symbol(self) -> &'static str {
        match self {
            SyncAction::Create => "+",
            SyncAction::Update => "~",
            SyncAction::Delete => "-",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Counters of one sync pass (or the sum of several).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Records scanned without a resolvable start
    pub skipped: usize,
}

impl SyncStats {
    pub fn record(&mut self, action: SyncAction) {
        match action {
            SyncAction::Create => self.created += 1,
            SyncAction::Update => self.updated += 1,
            SyncAction::Delete => self.deleted += 1,
        }
    }

    pub fn count(&self, action: SyncAction) -> usize {
        match action {
            SyncAction::Create => self.created,
            SyncAction::Update => self.updated,
            SyncAction::Delete => self.deleted,
        }
    }

    /// Whether the pass created or deleted anything.
    pub fn changed_membership(&self) -> bool {
        self.created > 0 || self.deleted > 0
    }
}

impl AddAssign for SyncStats {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_sum() {
        let mut a = SyncStats::default();
        a.record(SyncAction::Create);
        a.record(SyncAction::Update);
        a.record(SyncAction::Update);

        let mut total = SyncStats {
            deleted: 1,
            skipped: 4,
            ..Default::default()
        };
        total += a;

        assert_eq!(total.count(SyncAction::Create), 1);
        assert_eq!(total.count(SyncAction::Update), 2);
        assert_eq!(total.count(SyncAction::Delete), 1);
        assert_eq!(total.skipped, 4);
        assert!(total.changed_membership());
        assert!(!SyncStats::default().changed_membership());
    }
}
