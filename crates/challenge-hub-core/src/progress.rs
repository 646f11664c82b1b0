//! Completion estimates for participations.
//!
//! An explicit score always wins. Without one, progress is estimated from
//! the elapsed share of the date span and kept inside
//! [`ESTIMATE_FLOOR`]..=[`ESTIMATE_CEILING`] so an in-progress item never
//! reads as untouched or finished.

use time::OffsetDateTime;

use crate::records::ParticipationRecord;

pub const ESTIMATE_FLOOR: u8 = 10;
pub const ESTIMATE_CEILING: u8 = 90;

const NANOS_PER_DAY: i128 = 86_400 * 1_000_000_000;

/// Ceiling of `(to - from)` in days; negative when `to` precedes `from`.
fn ceil_days(from: OffsetDateTime, to: OffsetDateTime) -> i64 {
    let nanos = (to - from).whole_nanoseconds();
    let days = nanos / NANOS_PER_DAY + i128::from(nanos % NANOS_PER_DAY > 0);
    i64::try_from(days).unwrap_or(if days < 0 { i64::MIN } else { i64::MAX })
}

fn days_as_f64(days: i64) -> f64 {
    f64::from(i32::try_from(days).unwrap_or(if days < 0 { i32::MIN } else { i32::MAX }))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_percent(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

/// A finite score clamped to `0..=100` and rounded.
#[must_use]
pub fn score_percent(score: Option<f64>) -> Option<u8> {
    score.filter(|score| score.is_finite()).map(to_percent)
}

/// Whole days remaining until `end`, never negative. `None` when there is no end.
#[must_use]
pub fn days_left(end: Option<OffsetDateTime>, now: OffsetDateTime) -> Option<i64> {
    end.map(|end| ceil_days(now, end).max(0))
}

/// Estimate completion in `0..=100`.
///
/// A finite `score` is clamped and rounded. Otherwise both bounds are
/// required; a span of zero or negative length counts as fully elapsed once
/// `now` is past `end` and as not started before that.
#[must_use]
pub fn estimate(
    score: Option<f64>,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> u8 {
    if let Some(percent) = score_percent(score) {
        return percent;
    }

    let (Some(start), Some(end)) = (start, end) else {
        return 0;
    };

    let total_days = days_as_f64(ceil_days(start, end));
    let remaining_days = days_as_f64(ceil_days(now, end));
    let percent = if total_days > 0.0 {
        (total_days - remaining_days) / total_days * 100.0
    } else if now > end {
        100.0
    } else {
        0.0
    };

    to_percent(percent.clamp(f64::from(ESTIMATE_FLOOR), f64::from(ESTIMATE_CEILING)))
}

/// Progress of one participation, using the embedded challenge's bounds when
/// the snapshot carries them.
#[must_use]
pub fn participation_progress(participation: &ParticipationRecord, now: OffsetDateTime) -> u8 {
    let bounds = participation.challenge.bounds().unwrap_or_default();
    estimate(participation.score, bounds.start, bounds.end, now)
}
