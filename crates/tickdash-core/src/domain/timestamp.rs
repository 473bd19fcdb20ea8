use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::ValidationError;

const SECONDS_PER_HOUR: i64 = 3_600;

const SQL_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// RFC3339 timestamp guaranteed to be UTC with a four-digit, non-negative year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            }
        })?;

        Self::from_offset_datetime(parsed).map_err(|_| ValidationError::TimestampNotUtc {
            value: input.to_owned(),
        })
    }

    pub fn from_offset_datetime(value: OffsetDateTime) -> Result<Self, ValidationError> {
        if value.offset() != UtcOffset::UTC || value.year() < 0 {
            return Err(ValidationError::TimestampNotUtc {
                value: value
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| String::from("<unformattable>")),
            });
        }

        Ok(Self(value))
    }

    /// Convert unix seconds, rejecting values outside years 0000-9999.
    pub fn from_unix_timestamp(seconds: i64) -> Result<Self, ValidationError> {
        let value = OffsetDateTime::from_unix_timestamp(seconds)
            .map_err(|_| ValidationError::TimestampOutOfRange { value: seconds })?;
        if value.year() < 0 {
            return Err(ValidationError::TimestampOutOfRange { value: seconds });
        }
        Ok(Self(value))
    }

    pub fn unix_timestamp(self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Instant at which the hour containing `self` starts, on a clock
    /// `utc_offset_secs` east of UTC.
    pub fn floor_to_local_hour(self, utc_offset_secs: i32) -> Self {
        let local = self.0.unix_timestamp() + i64::from(utc_offset_secs);
        let start = local - local.rem_euclid(SECONDS_PER_HOUR) - i64::from(utc_offset_secs);
        Self::from_unix_timestamp(start).unwrap_or(self)
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .expect("UtcDateTime must be RFC3339 formattable")
    }

    /// Naive `YYYY-MM-DD HH:MM:SS` text accepted by SQL timestamp casts.
    pub fn format_sql(self) -> String {
        self.0
            .format(SQL_FORMAT)
            .expect("UtcDateTime must be SQL formattable")
    }

    /// [`format_sql`](Self::format_sql) on a clock `utc_offset_secs` east of UTC.
    ///
    /// Offsets beyond what a clock can show fall back to UTC.
    pub fn format_local_sql(self, utc_offset_secs: i32) -> String {
        let local = UtcOffset::from_whole_seconds(utc_offset_secs)
            .ok()
            .and_then(|offset| self.0.checked_to_offset(offset))
            .unwrap_or(self.0);
        local
            .format(SQL_FORMAT)
            .expect("UtcDateTime must be SQL formattable")
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_timestamp() {
        let parsed = UtcDateTime::parse("2024-01-01T00:00:00Z").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn rejects_non_utc_timestamp() {
        let err = UtcDateTime::parse("2024-01-01T01:00:00+01:00").expect_err("must fail");
        assert!(matches!(err, ValidationError::TimestampNotUtc { .. }));
    }

    #[test]
    fn converts_unix_seconds_both_ways() {
        let parsed = UtcDateTime::from_unix_timestamp(1_704_101_700).expect("in range");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T09:35:00Z");
        assert_eq!(parsed.unix_timestamp(), 1_704_101_700);
    }

    #[test]
    fn rejects_out_of_range_unix_seconds() {
        assert!(matches!(
            UtcDateTime::from_unix_timestamp(i64::MAX),
            Err(ValidationError::TimestampOutOfRange { .. })
        ));
        assert!(matches!(
            UtcDateTime::from_unix_timestamp(-70_000_000_000),
            Err(ValidationError::TimestampOutOfRange { .. })
        ));
    }

    #[test]
    fn floors_to_hour_and_formats_for_sql() {
        let parsed = UtcDateTime::parse("2024-03-05T14:59:59.250Z").expect("must parse");
        let hour = parsed.floor_to_local_hour(0);
        assert_eq!(hour.format_rfc3339(), "2024-03-05T14:00:00Z");
        assert_eq!(hour.format_sql(), "2024-03-05 14:00:00");
    }

    #[test]
    fn floors_to_exchange_hour() {
        let parsed = UtcDateTime::parse("2024-03-05T04:10:00Z").expect("must parse");

        let ist = parsed.floor_to_local_hour(19_800);
        assert_eq!(ist.format_rfc3339(), "2024-03-05T03:30:00Z");
        assert_eq!(ist.format_local_sql(19_800), "2024-03-05 09:00:00");

        let new_york = parsed.floor_to_local_hour(-18_000);
        assert_eq!(new_york.format_rfc3339(), "2024-03-05T04:00:00Z");
        assert_eq!(new_york.format_local_sql(-18_000), "2024-03-04 23:00:00");
    }

    #[test]
    fn out_of_range_offset_formats_as_utc() {
        let parsed = UtcDateTime::parse("2024-03-05T04:10:00Z").expect("must parse");
        assert_eq!(parsed.format_local_sql(i32::MAX), "2024-03-05 04:10:00");
    }
}
