//! Per-category payloads as written by the producer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Category;

/// The latest value of one category: `{ "timestamp": .., "data": .. }`.
///
/// `data` is opaque to the cache and passed through verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub timestamp: u64,
    #[serde(default)]
    pub data: Value,
}

impl CategoryPayload {
    pub fn new(timestamp: u64, data: impl Into<Value>) -> Self {
        Self {
            timestamp,
            data: data.into(),
        }
    }

    /// True when `self` should replace `retained` under the keep-newest rule.
    pub fn is_newer_than(&self, retained: &CategoryPayload) -> bool {
        self.timestamp > retained.timestamp
    }
}

/// One parsed log line: category key to payload, untyped until asked.
#[derive(Debug)]
pub struct LogRecord(Map<String, Value>);

impl LogRecord {
    /// Parses a line as a JSON object. Anything else is `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => Some(Self(map)),
            _ => None,
        }
    }

    /// Payload for `category`, if present and carrying an integer timestamp.
    pub fn payload(&self, category: Category) -> Option<CategoryPayload> {
        let value = self.0.get(category.key())?;
        CategoryPayload::deserialize(value).ok()
    }
}
