use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Reads an RFC 3339 timestamp. `null`, a missing field or anything unparseable (an invalid
/// browser `Date` serializes to `null`) becomes `None` instead of failing the whole collection.
pub fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let res = raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|datetime| datetime.with_timezone(&Utc));
    Ok(res)
}
