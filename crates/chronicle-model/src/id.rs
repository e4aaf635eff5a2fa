//! Snowflake identifiers.
//!
//! Every upstream entity is identified by a 64-bit snowflake whose high
//! 42 bits encode a millisecond timestamp relative to [`EPOCH_MS`]. Because
//! the timestamp occupies the high bits, the numeric order of two ids is
//! also their chronological order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ModelError;

/// Milliseconds between the Unix epoch and the upstream snowflake epoch
/// (2015-01-01T00:00:00Z).
pub const EPOCH_MS: u64 = 1_420_070_400_000;

/// A 64-bit snowflake identifier.
///
/// Ids are kept as `u64` end to end; widening to a float would lose the low
/// bits of recent ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

impl Id {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Parse a decimal id string.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ModelError::InvalidId(s.to_string()))
    }

    /// Parse either a decimal id string or an ISO-8601 date.
    ///
    /// Dates produce a synthetic id whose timestamp bits match the given
    /// instant, which makes them usable as range cursors.
    pub fn parse_flexible(s: &str) -> Result<Self, ModelError> {
        if let Ok(id) = Self::parse(s) {
            return Ok(id);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
            return Ok(Self::from_date(dt.with_timezone(&Utc)));
        }
        if let Ok(date) = NaiveDate::from_str(s.trim()) {
            let dt = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default());
            return Ok(Self::from_date(dt));
        }
        Err(ModelError::InvalidId(s.to_string()))
    }

    /// Derive a synthetic id from a wall-clock instant.
    pub fn from_date(instant: DateTime<Utc>) -> Self {
        let ms = instant.timestamp_millis().max(0) as u64;
        Self(ms.saturating_sub(EPOCH_MS) << 22)
    }

    /// The instant encoded in the high 42 bits.
    pub fn timestamp(self) -> DateTime<Utc> {
        let ms = (self.0 >> 22) + EPOCH_MS;
        Utc.timestamp_millis_opt(ms as i64)
            .single()
            .unwrap_or_default()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for Id {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// The upstream serialises ids as decimal strings to avoid precision loss in
// JavaScript consumers; accept both strings and raw integers on the way in.
impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => Id::parse(&s).map_err(serde::de::Error::custom),
            Raw::Num(n) => Ok(Id(n)),
        }
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parse_round_trips_decimal_strings() {
        for s in ["0", "1", "175928847299117063", "18446744073709551615"] {
            assert_eq!(Id::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Id::parse("not-an-id").is_err());
        assert!(Id::parse("-5").is_err());
        assert!(Id::parse("").is_err());
    }

    #[test]
    fn timestamp_of_known_id() {
        let id = Id::parse("175928847299117063").unwrap();
        let ts = id.timestamp();
        assert_eq!(ts.year(), 2016);
        assert_eq!(ts.month(), 4);
    }

    #[test]
    fn from_date_round_trips_within_a_second() {
        let instant = Utc.with_ymd_and_hms(2021, 6, 15, 12, 30, 45).unwrap();
        let diff = (Id::from_date(instant).timestamp() - instant).num_milliseconds();
        assert!(diff.abs() <= 1000, "drift was {diff}ms");
    }

    #[test]
    fn order_matches_timestamp_order() {
        let early = Id::from_date(Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap());
        let late = Id::from_date(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert!(early < late);
        assert!(early.timestamp() < late.timestamp());
    }

    #[test]
    fn parse_flexible_accepts_dates() {
        let id = Id::parse_flexible("2020-01-01").unwrap();
        assert_eq!(id.timestamp().year(), 2020);

        let id = Id::parse_flexible("2020-06-01T10:00:00Z").unwrap();
        assert_eq!(id.timestamp().month(), 6);
    }

    #[test]
    fn deserialize_from_string_or_number() {
        let id: Id = serde_json::from_str("\"12345\"").unwrap();
        assert_eq!(id.value(), 12345);
        let id: Id = serde_json::from_str("12345").unwrap();
        assert_eq!(id.value(), 12345);
    }
}
