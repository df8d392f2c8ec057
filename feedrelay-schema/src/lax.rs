use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a string, a number, or null and yields a string (null becomes empty).
///
/// Upstream feeds are inconsistent about timestamps and ids: the same field shows up as
/// `"1700000000"` on one endpoint and `1700000000` on another.
pub(crate) fn string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or a number, got {other}"
        ))),
    }
}
