use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Caller-supplied description of an interaction, before enrichment.
///
/// Only `event_type` is required; the classification fields default to empty strings
/// and the value to `None`.
///
/// ```rust
/// use eventline::EventInput;
///
/// let input = EventInput::new("search")
///     .category("search")
///     .action("query")
///     .label("plomero")
///     .value(12.0)
///     .meta("city", "Bogotá");
/// assert_eq!(input.label, "plomero");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventInput {
    pub event_type: String,
    pub category: String,
    pub action: String,
    pub label: String,
    pub value: Option<f64>,
    /// Overrides the identity resolved from storage.
    pub user_id: Option<String>,
    pub metadata: Map<String, Value>,
}

impl EventInput {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self { event_type: event_type.into(), ..Self::default() }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// An enriched telemetry record, exactly as it goes over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_type: String,
    pub category: String,
    pub action: String,
    pub label: String,
    pub value: Option<f64>,
    pub session_id: String,
    pub user_id: Option<String>,
    /// RFC 3339, assigned at enrichment time.
    pub timestamp: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_type)?;
        if !self.category.is_empty() || !self.action.is_empty() {
            write!(f, "({}/{})", self.category, self.action)?;
        }
        if !self.label.is_empty() {
            write!(f, " label={}", self.label)?;
        }
        if let Some(value) = self.value {
            write!(f, " value={}", value)?;
        }
        write!(f, " @{}", self.timestamp)
    }
}
