use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Nullable integer columns read as zero.
pub fn zero_if_null<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

/// Nullable JSON columns read as an empty object.
pub fn object_if_null<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .filter(|v| !v.is_null())
        .unwrap_or_else(|| Value::Object(Map::new())))
}

pub fn empty_object() -> Value {
    Value::Object(Map::new())
}
