use serde::Deserialize;
use serde_json::{Map, Value};

/// A loosely typed source record: field names and value types are whatever
/// the source emitted. Accessors render scalars to trimmed text and treat
/// null, empty strings and containers as missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(value_text)
    }

    /// First non-empty value among `aliases`, matching keys case-insensitively
    /// and ignoring surrounding whitespace. Alias order is precedence order.
    pub fn text_any(&self, aliases: &[&str]) -> Option<String> {
        for alias in aliases {
            let hit = self
                .0
                .iter()
                .filter(|(key, _)| key.trim().eq_ignore_ascii_case(alias))
                .find_map(|(_, value)| value_text(value));
            if hit.is_some() {
                return hit;
            }
        }
        None
    }

    pub fn text_path(&self, path: &[&str]) -> Option<String> {
        let (first, rest) = path.split_first()?;
        let mut cur = self.0.get(*first)?;
        for key in rest {
            cur = cur.get(*key)?;
        }
        value_text(cur)
    }

    pub fn texts(&self, key: &str) -> Vec<String> {
        self.0
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(value_text).collect())
            .unwrap_or_default()
    }

    pub fn array(&self, key: &str) -> &[Value] {
        self.0
            .get(key)
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
