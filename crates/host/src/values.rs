use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A primitive value carried in analytics payloads and host callbacks.
/// This is intentionally small; pages only ever attach primitives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    /// The `null` value.
    Null,
    /// A boolean primitive.
    Bool(bool),
    /// A number (IEEE 754 double precision).
    Number(f64),
    /// A string value (UTF-8).
    String(String),
}

/// Mapping of string keys to primitives, ordered for stable serialization.
pub type EventPayload = BTreeMap<String, EventValue>;

impl Display for EventValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for EventValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for EventValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for EventValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for EventValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for EventValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for EventValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Log severity levels understood by the page console.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn payloads_serialize_as_plain_json() -> Result<()> {
        let mut payload = EventPayload::new();
        payload.insert("percent".to_owned(), EventValue::from(50u32));
        payload.insert("label".to_owned(), EventValue::from("Get started"));
        payload.insert("form_id".to_owned(), EventValue::from(None::<String>));
        let json = serde_json::to_string(&payload)?;
        assert_eq!(json, r#"{"form_id":null,"label":"Get started","percent":50.0}"#);
        Ok(())
    }

    #[test]
    fn display_matches_script_stringification() {
        assert_eq!(EventValue::from(true).to_string(), "true");
        assert_eq!(EventValue::Null.to_string(), "null");
        assert_eq!(EventValue::from("x").to_string(), "x");
    }
}
