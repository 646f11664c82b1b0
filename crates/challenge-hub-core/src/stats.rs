//! Summary counts over a snapshot or over pipeline output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::category::{Vocabulary, FALLBACK_CATEGORY};
use crate::pipeline::Listing;
use crate::records::{
    AccountStatus, ActivityStatus, ChallengeRecord, GroupRecord, MembershipStatus,
    ParticipationRecord, Rarity, RewardRecord, UserRecord, UserRole,
};
use crate::status::DerivedStatus;

pub const POINTS_DISTRIBUTED: &str = "points_distributed";
pub const MEMBERS: &str = "members";

#[must_use]
pub fn flag_key(prefix: &str, value: &str) -> String {
    format!("{prefix}:{value}")
}

/// Entity-specific counters folded into [`Aggregate::by_flag`].
pub trait FlagTally {
    /// Insert every counter this type reports, at zero.
    fn seed(flags: &mut BTreeMap<String, u64>, vocabulary: &Vocabulary);

    fn tally(&self, flags: &mut BTreeMap<String, u64>, vocabulary: &Vocabulary);
}

fn bump(flags: &mut BTreeMap<String, u64>, key: String, amount: u64) {
    let counter = flags.entry(key).or_insert(0);
    *counter = counter.saturating_add(amount);
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct StatusCounts {
    pub upcoming: usize,
    pub active: usize,
    pub completed: usize,
}

impl StatusCounts {
    fn record(&mut self, status: DerivedStatus) {
        match status {
            DerivedStatus::Upcoming => self.upcoming += 1,
            DerivedStatus::Active => self.active += 1,
            DerivedStatus::Completed => self.completed += 1,
        }
    }

    #[must_use]
    pub fn get(self, status: DerivedStatus) -> usize {
        match status {
            DerivedStatus::Upcoming => self.upcoming,
            DerivedStatus::Active => self.active,
            DerivedStatus::Completed => self.completed,
        }
    }

    #[must_use]
    pub fn total(self) -> usize {
        self.upcoming + self.active + self.completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub total: usize,
    /// Present only for time-bounded record types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_status: Option<StatusCounts>,
    pub by_flag: BTreeMap<String, u64>,
}

/// Fold records into summary counts using the built-in vocabulary.
pub fn aggregate<'a, T, I>(records: I, now: OffsetDateTime) -> Aggregate
where
    I: IntoIterator<Item = &'a T>,
    T: Listing + FlagTally + 'a,
{
    aggregate_with(records, Vocabulary::builtin(), now)
}

/// Fold records into summary counts. Never filters.
pub fn aggregate_with<'a, T, I>(records: I, vocabulary: &Vocabulary, now: OffsetDateTime) -> Aggregate
where
    I: IntoIterator<Item = &'a T>,
    T: Listing + FlagTally + 'a,
{
    let mut total = 0;
    let mut by_status = T::TIME_BOUNDED.then(StatusCounts::default);
    let mut by_flag = BTreeMap::new();
    T::seed(&mut by_flag, vocabulary);

    for record in records {
        total += 1;
        if let Some(counts) = by_status.as_mut() {
            counts.record(record.derived_status(now));
        }
        record.tally(&mut by_flag, vocabulary);
    }

    Aggregate { total, by_status, by_flag }
}

/// Counts over the shown subset next to counts over the whole snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ListingSummary {
    pub shown: Aggregate,
    pub overall: Aggregate,
}

pub fn summarize<'a, T>(
    overall: &'a [T],
    shown: &[&'a T],
    vocabulary: &Vocabulary,
    now: OffsetDateTime,
) -> ListingSummary
where
    T: Listing + FlagTally,
{
    ListingSummary {
        shown: aggregate_with(shown.iter().copied(), vocabulary, now),
        overall: aggregate_with(overall, vocabulary, now),
    }
}

impl FlagTally for ChallengeRecord {
    fn seed(flags: &mut BTreeMap<String, u64>, vocabulary: &Vocabulary) {
        for label in vocabulary.labels().chain([FALLBACK_CATEGORY]) {
            flags.insert(flag_key("category", label), 0);
        }
    }

    fn tally(&self, flags: &mut BTreeMap<String, u64>, vocabulary: &Vocabulary) {
        let label = vocabulary.canonicalize(self.category.as_deref());
        bump(flags, flag_key("category", &label), 1);
    }
}

impl FlagTally for ParticipationRecord {
    fn seed(flags: &mut BTreeMap<String, u64>, _vocabulary: &Vocabulary) {
        for status in MembershipStatus::ALL {
            flags.insert(flag_key("membership", status.as_str()), 0);
        }
    }

    fn tally(&self, flags: &mut BTreeMap<String, u64>, _vocabulary: &Vocabulary) {
        bump(flags, flag_key("membership", self.status.as_str()), 1);
    }
}

impl FlagTally for UserRecord {
    fn seed(flags: &mut BTreeMap<String, u64>, _vocabulary: &Vocabulary) {
        for role in UserRole::ALL {
            flags.insert(flag_key("role", role.as_str()), 0);
        }
        for status in AccountStatus::ALL {
            flags.insert(flag_key("status", status.as_str()), 0);
        }
    }

    fn tally(&self, flags: &mut BTreeMap<String, u64>, _vocabulary: &Vocabulary) {
        bump(flags, flag_key("role", self.role.as_str()), 1);
        bump(flags, flag_key("status", self.status.as_str()), 1);
    }
}

impl FlagTally for GroupRecord {
    fn seed(flags: &mut BTreeMap<String, u64>, _vocabulary: &Vocabulary) {
        for status in ActivityStatus::ALL {
            flags.insert(flag_key("status", status.as_str()), 0);
        }
        flags.insert(MEMBERS.to_string(), 0);
    }

    fn tally(&self, flags: &mut BTreeMap<String, u64>, _vocabulary: &Vocabulary) {
        bump(flags, flag_key("status", self.status.as_str()), 1);
        bump(flags, MEMBERS.to_string(), self.member_count());
    }
}

impl FlagTally for RewardRecord {
    fn seed(flags: &mut BTreeMap<String, u64>, _vocabulary: &Vocabulary) {
        for status in ActivityStatus::ALL {
            flags.insert(flag_key("status", status.as_str()), 0);
        }
        for rarity in Rarity::ALL {
            flags.insert(flag_key("rarity", rarity.as_str()), 0);
        }
        flags.insert(POINTS_DISTRIBUTED.to_string(), 0);
    }

    fn tally(&self, flags: &mut BTreeMap<String, u64>, _vocabulary: &Vocabulary) {
        bump(flags, flag_key("status", self.status.as_str()), 1);
        bump(flags, flag_key("rarity", self.rarity.as_str()), 1);
        bump(flags, POINTS_DISTRIBUTED.to_string(), self.points_distributed());
    }
}
