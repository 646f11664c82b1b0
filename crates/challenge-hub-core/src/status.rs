use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::CoreError;

/// Lifecycle state derived from a record's time bounds. Never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DerivedStatus {
    Upcoming,
    Active,
    Completed,
}

impl DerivedStatus {
    pub const ALL: [Self; 3] = [Self::Upcoming, Self::Active, Self::Completed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "upcoming" => Some(Self::Upcoming),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl Display for DerivedStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional start/end instants of a time-bounded record. `end` may precede
/// `start`; nothing here assumes otherwise.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct TimeBounds {
    #[serde(with = "time::serde::rfc3339::option")]
    pub start: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
}

impl TimeBounds {
    #[must_use]
    pub fn new(start: Option<OffsetDateTime>, end: Option<OffsetDateTime>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn classify(self, now: OffsetDateTime) -> DerivedStatus {
        classify(self.start, self.end, now)
    }
}

/// Classify a record against `now`. Start is checked before end, so a record
/// whose end precedes its start is still `upcoming` until it starts.
#[must_use]
pub fn classify(
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> DerivedStatus {
    if start.is_some_and(|start| now < start) {
        return DerivedStatus::Upcoming;
    }

    if end.is_some_and(|end| now > end) {
        return DerivedStatus::Completed;
    }

    DerivedStatus::Active
}

/// Status selector of the filter pipeline; `All` is the no-op sentinel.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(into = "String", try_from = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(DerivedStatus),
}

impl StatusFilter {
    pub const SENTINEL: &'static str = "all";

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => Self::SENTINEL,
            Self::Only(status) => status.as_str(),
        }
    }

    /// # Errors
    /// Returns [`CoreError::Parse`] for anything other than `all` or a derived status.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() || normalized == Self::SENTINEL {
            return Ok(Self::All);
        }
        DerivedStatus::parse(&normalized)
            .map(Self::Only)
            .ok_or_else(|| CoreError::Parse(format!("unknown status filter: {value}")))
    }

    #[must_use]
    pub fn admits(self, status: DerivedStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl From<StatusFilter> for String {
    fn from(value: StatusFilter) -> Self {
        value.as_str().to_string()
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}
