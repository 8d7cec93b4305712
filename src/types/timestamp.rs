//! Timestamp handling for Rocket.Chat payloads
//!
//! The server is not consistent about how it sends dates: REST responses use
//! ISO-8601 strings, realtime (DDP) frames use `{"$date": <millis>}` and some
//! fields are plain epoch milliseconds. All of them decode to `i64`
//! milliseconds since the epoch and serialize back as a plain number.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result as CrateResult};

/// Milliseconds since the epoch, decoded from any of the server's date shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Millis(pub i64);

impl<'de> Deserialize<'de> for Millis {
    fn deserialize<D>(deserializer: D) -> Result<Millis, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MillisVisitor)
    }
}

struct MillisVisitor;

impl<'de> Visitor<'de> for MillisVisitor {
    type Value = Millis;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("epoch milliseconds, an ISO-8601 string or a {\"$date\": millis} object")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Millis(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        i64::try_from(value)
            .map(Millis)
            .map_err(|_| E::custom(format!("timestamp out of range: {}", value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        // `i64::MAX as f64` rounds up to 2^63, which is itself out of range
        if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
            Ok(Millis(value as i64))
        } else {
            Err(E::custom(format!("timestamp out of range: {}", value)))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        match DateTime::parse_from_rfc3339(value) {
            Ok(dt) => Ok(Millis(dt.timestamp_millis())),
            Err(e) => Err(E::custom(format!("could not parse date `{}`: {}", value, e))),
        }
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut millis = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == "$date" {
                millis = Some(map.next_value::<Millis>()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        millis.ok_or_else(|| de::Error::missing_field("$date"))
    }
}

/// `#[serde(with = "timestamp::option")]` helper for optional timestamps
pub mod option {
    use super::Millis;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Millis>::deserialize(deserializer)?.map(|m| m.0))
    }

    pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ms) => serializer.serialize_some(ms),
            None => serializer.serialize_none(),
        }
    }
}

/// `#[serde(with = "timestamp::required")]` helper for mandatory timestamps
pub mod required {
    use super::Millis;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Millis::deserialize(deserializer)?.0)
    }

    pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(*value)
    }
}

/// Convert epoch milliseconds to `DateTime<Utc>`
pub fn to_datetime(timestamp_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(timestamp_ms)
}

/// Format epoch milliseconds the way the REST API expects in query strings
///
/// Fails with `InvalidArgument` for values chrono can't represent.
pub fn to_iso8601(timestamp_ms: i64) -> CrateResult<String> {
    to_datetime(timestamp_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| Error::invalid_argument(format!("Timestamp out of range: {timestamp_ms}")))
}
