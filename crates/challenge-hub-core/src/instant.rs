//! Lenient conversion of snapshot date strings into [`OffsetDateTime`].
//!
//! The remote service is not trusted to always send well-formed dates, so a
//! value that cannot be parsed is reported as absent instead of failing the
//! whole snapshot.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Parse an RFC3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` timestamp
/// (read as UTC) or a bare `YYYY-MM-DD` date (midnight UTC).
#[must_use]
pub fn parse_instant(value: &str) -> Option<OffsetDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(parsed);
    }

    if let Ok(parsed) = PrimitiveDateTime::parse(
        trimmed,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(parsed.assume_utc());
    }

    if let Ok(parsed) = PrimitiveDateTime::parse(
        trimmed,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    ) {
        return Some(parsed.assume_utc());
    }

    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Serde adapter for optional instants: serializes as RFC3339, deserializes
/// leniently through [`parse_instant`].
pub mod lenient {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use time::OffsetDateTime;

    use super::parse_instant;

    /// # Errors
    /// Returns the serializer's error when the instant cannot be rendered as RFC3339.
    pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        time::serde::rfc3339::option::serialize(value, serializer)
    }

    /// # Errors
    /// Only fails when the underlying input is not valid JSON-like data; malformed
    /// dates become `None`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => {
                let parsed = parse_instant(&text);
                if parsed.is_none() && !text.trim().is_empty() {
                    tracing::warn!(value = %text, "ignoring malformed instant in snapshot");
                }
                parsed
            }
            Some(other) => {
                tracing::warn!(value = %other, "ignoring non-string instant in snapshot");
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn parses_rfc3339_with_offset_and_fraction() {
        assert_eq!(
            parse_instant("2024-01-20T10:30:00.250Z"),
            Some(datetime!(2024-01-20 10:30:00.25 UTC))
        );
        assert_eq!(
            parse_instant("2024-01-20T12:00:00+02:00"),
            Some(datetime!(2024-01-20 10:00:00 UTC))
        );
    }

    #[test]
    fn parses_bare_dates_as_utc_midnight() {
        assert_eq!(parse_instant("2024-01-20"), Some(datetime!(2024-01-20 0:00 UTC)));
        assert_eq!(parse_instant(" 2024-01-20 "), Some(datetime!(2024-01-20 0:00 UTC)));
    }

    #[test]
    fn parses_naive_timestamps_as_utc() {
        assert_eq!(parse_instant("2024-01-20T08:15:00"), Some(datetime!(2024-01-20 8:15 UTC)));
        assert_eq!(
            parse_instant("2024-01-20T08:15:00.5"),
            Some(datetime!(2024-01-20 8:15:00.5 UTC))
        );
    }

    #[test]
    fn malformed_values_degrade_to_absent() {
        for raw in ["", "   ", "not a date", "2024-13-45", "20/01/2024"] {
            assert_eq!(parse_instant(raw), None, "`{raw}` should not parse");
        }
    }

    #[derive(Debug, serde::Deserialize)]
    struct Holder {
        #[serde(default, with = "lenient")]
        at: Option<OffsetDateTime>,
    }

    #[test]
    fn lenient_deserializer_tolerates_garbage() {
        let cases = [
            (r#"{"at": "2024-01-20"}"#, Some(datetime!(2024-01-20 0:00 UTC))),
            (r#"{"at": "garbage"}"#, None),
            (r#"{"at": ""}"#, None),
            (r#"{"at": null}"#, None),
            (r#"{"at": 1705708800}"#, None),
            (r#"{}"#, None),
        ];
        for (json, expected) in cases {
            let holder: Holder = match serde_json::from_str(json) {
                Ok(holder) => holder,
                Err(err) => panic!("lenient fixture {json} should deserialize: {err}"),
            };
            assert_eq!(holder.at, expected, "fixture {json}");
        }
    }
}
