//! Derivation and filtering core for the challenge hub.
//!
//! Every time-sensitive function takes `now` explicitly; nothing in this
//! crate reads a clock, performs I/O, or keeps mutable global state.

mod error;

pub mod category;
pub mod instant;
pub mod pipeline;
pub mod progress;
pub mod records;
pub mod stats;
pub mod status;

pub use category::{
    canonicalize, matches, CategorySpec, Vocabulary, VocabularyEntry, ALL_CATEGORIES,
    DEFAULT_VOCABULARY, FALLBACK_CATEGORY,
};
pub use error::CoreError;
pub use instant::parse_instant;
pub use pipeline::{
    annotate, apply, apply_with, collation_key, Annotated, Derived, FilterParams, Listing, SortKey,
};
pub use progress::{
    days_left, estimate, participation_progress, score_percent, ESTIMATE_CEILING, ESTIMATE_FLOOR,
};
pub use records::{
    AccountStatus, ActivityStatus, ChallengeRecord, ChallengeRef, GroupRecord, GroupStats,
    MembershipStatus, ParticipationRecord, Rarity, RecordId, RewardRecord, UserRecord, UserRole,
};
pub use stats::{
    aggregate, aggregate_with, flag_key, summarize, Aggregate, FlagTally, ListingSummary,
    StatusCounts, MEMBERS, POINTS_DISTRIBUTED,
};
pub use status::{classify, DerivedStatus, StatusFilter, TimeBounds};
