//! Snapshot records as delivered by the remote service.
//!
//! Every record is read-only here. Optional or `null` fields fall back to
//! their documented defaults instead of failing the snapshot, and dates go
//! through [`crate::instant::lenient`].

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::pipeline::Listing;
use crate::progress::{participation_progress, score_percent};
use crate::status::TimeBounds;

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn len_as_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Identifier assigned by the remote service. Numeric identifiers are kept
/// in their decimal string form.
#[derive(Debug, Clone, Serialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => Self(value),
            RawId::Signed(value) => Self(value.to_string()),
            RawId::Unsigned(value) => Self(value.to_string()),
        })
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, with = "crate::instant::lenient")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "crate::instant::lenient")]
    pub end_date: Option<OffsetDateTime>,
    #[serde(default, with = "crate::instant::lenient")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "nullable", alias = "participants")]
    pub participants_count: u64,
}

impl ChallengeRecord {
    #[must_use]
    pub fn bounds(&self) -> TimeBounds {
        TimeBounds::new(self.start_date, self.end_date)
    }
}

impl Listing for ChallengeRecord {
    const TIME_BOUNDED: bool = true;
    const CATEGORIZED: bool = true;

    fn title(&self) -> &str {
        &self.title
    }

    fn subtitle(&self) -> &str {
        &self.description
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn bounds(&self) -> TimeBounds {
        ChallengeRecord::bounds(self)
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    fn popularity(&self) -> u64 {
        self.participants_count
    }
}

/// A participation's challenge, either populated or as a bare identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChallengeRef {
    Embedded(Box<ChallengeRecord>),
    Id(RecordId),
}

impl ChallengeRef {
    #[must_use]
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Embedded(challenge) => &challenge.id,
            Self::Id(id) => id,
        }
    }

    #[must_use]
    pub fn challenge(&self) -> Option<&ChallengeRecord> {
        match self {
            Self::Embedded(challenge) => Some(&**challenge),
            Self::Id(_) => None,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Option<TimeBounds> {
        self.challenge().map(ChallengeRecord::bounds)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Pending,
    Confirmed,
}

impl MembershipStatus {
    pub const ALL: [Self; 2] = [Self::Pending, Self::Confirmed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRecord {
    pub id: RecordId,
    pub challenge: ChallengeRef,
    pub status: MembershipStatus,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, with = "crate::instant::lenient")]
    pub joined_at: Option<OffsetDateTime>,
}

impl Listing for ParticipationRecord {
    const TIME_BOUNDED: bool = true;
    const CATEGORIZED: bool = true;

    fn title(&self) -> &str {
        self.challenge.challenge().map_or("", |challenge| challenge.title.as_str())
    }

    fn subtitle(&self) -> &str {
        self.challenge.challenge().map_or("", |challenge| challenge.description.as_str())
    }

    fn category(&self) -> Option<&str> {
        self.challenge.challenge().and_then(|challenge| challenge.category.as_deref())
    }

    fn bounds(&self) -> TimeBounds {
        self.challenge.bounds().unwrap_or_default()
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        self.joined_at
    }

    fn popularity(&self) -> u64 {
        score_percent(self.score).map_or(0, u64::from)
    }

    fn progress(&self, now: OffsetDateTime) -> Option<u8> {
        Some(participation_progress(self, now))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Collaborator,
}

impl UserRole {
    pub const ALL: [Self; 2] = [Self::Admin, Self::Collaborator];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Collaborator => "collaborator",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "collaborator" => Some(Self::Collaborator),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

impl AccountStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Inactive, Self::Suspended];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "nullable", alias = "displayName")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    pub role: UserRole,
    pub status: AccountStatus,
    #[serde(default, deserialize_with = "nullable")]
    pub completed_challenges: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub points: u64,
    #[serde(default, with = "crate::instant::lenient")]
    pub created_at: Option<OffsetDateTime>,
}

impl Listing for UserRecord {
    fn title(&self) -> &str {
        &self.name
    }

    fn subtitle(&self) -> &str {
        &self.email
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    fn popularity(&self) -> u64 {
        self.points
    }
}

/// On/off switch shared by groups and rewards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Active,
    Inactive,
}

impl ActivityStatus {
    pub const ALL: [Self; 2] = [Self::Active, Self::Inactive];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupStats {
    #[serde(deserialize_with = "nullable")]
    pub member_count: u64,
    #[serde(deserialize_with = "nullable")]
    pub total_points: u64,
    #[serde(deserialize_with = "nullable")]
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default)]
    pub challenge: Option<ChallengeRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub members: Vec<UserRecord>,
    pub status: ActivityStatus,
    #[serde(default, deserialize_with = "nullable")]
    pub stats: GroupStats,
    #[serde(default, with = "crate::instant::lenient")]
    pub created_at: Option<OffsetDateTime>,
}

impl GroupRecord {
    /// The associated challenge when the snapshot embeds it.
    #[must_use]
    pub fn challenge(&self) -> Option<&ChallengeRecord> {
        self.challenge.as_ref().and_then(ChallengeRef::challenge)
    }

    /// Member count as reported by the service, or the embedded member list
    /// when that is larger.
    #[must_use]
    pub fn member_count(&self) -> u64 {
        self.stats.member_count.max(len_as_u64(self.members.len()))
    }
}

impl Listing for GroupRecord {
    const TIME_BOUNDED: bool = true;
    const CATEGORIZED: bool = true;

    fn title(&self) -> &str {
        &self.name
    }

    fn subtitle(&self) -> &str {
        &self.description
    }

    fn category(&self) -> Option<&str> {
        self.challenge().and_then(|challenge| challenge.category.as_deref())
    }

    fn bounds(&self) -> TimeBounds {
        self.challenge().map(ChallengeRecord::bounds).unwrap_or_default()
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    fn popularity(&self) -> u64 {
        self.member_count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Self; 4] = [Self::Common, Self::Rare, Self::Epic, Self::Legendary];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "common" => Some(Self::Common),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RewardRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable", alias = "cost")]
    pub points_cost: u64,
    #[serde(default)]
    pub category: Option<String>,
    pub rarity: Rarity,
    pub status: ActivityStatus,
    #[serde(default, deserialize_with = "nullable")]
    pub redemption_count: u64,
    #[serde(default, with = "crate::instant::lenient")]
    pub created_at: Option<OffsetDateTime>,
}

impl RewardRecord {
    #[must_use]
    pub fn points_distributed(&self) -> u64 {
        self.redemption_count.saturating_mul(self.points_cost)
    }
}

impl Listing for RewardRecord {
    const CATEGORIZED: bool = true;

    fn title(&self) -> &str {
        &self.name
    }

    fn subtitle(&self) -> &str {
        &self.description
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    fn popularity(&self) -> u64 {
        self.redemption_count
    }
}
