//! Serde helpers for UTC timestamps.
//!
//! Serialises as RFC 3339. Deserialisation also accepts offset-less
//! ISO-8601 timestamps (`2024-04-02T12:00:00`), which are read as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an RFC 3339 or offset-less ISO-8601 timestamp.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Formats a timestamp the way it is written on the wire and in storage.
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

/// Serialise as RFC 3339.
pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(value))
}

/// Deserialise any timestamp accepted by [`parse`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Same as the parent module, for optional fields.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialise as RFC 3339, or `null`.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&super::format(v)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialise `null` or a timestamp accepted by [`super::parse`].
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(with = "super")]
        at: DateTime<Utc>,
        #[serde(default, with = "super::option")]
        maybe: Option<DateTime<Utc>>,
    }

    #[test]
    fn accepts_naive_timestamps_as_utc() {
        let parsed: Wrapper = serde_json::from_str(r#"{"at":"2024-04-02T12:00:00"}"#).expect("naive");
        assert_eq!(parsed.at, Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap());
        assert_eq!(parsed.maybe, None);
    }

    #[test]
    fn accepts_offsets() {
        let parsed: Wrapper =
            serde_json::from_str(r#"{"at":"2024-04-02T14:00:00+02:00","maybe":"2024-04-03T00:00:00Z"}"#)
                .expect("offset");
        assert_eq!(parsed.at, Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap());
        assert_eq!(parsed.maybe, Some(Utc.with_ymd_and_hms(2024, 4, 3, 0, 0, 0).unwrap()));
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"at":"yesterday"}"#).is_err());
    }
}
