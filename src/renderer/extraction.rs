use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Fields whose HTML stands in for the page body when `page_content` is missing
const BODY_FALLBACK_FIELDS: &[&str] = &[
    "request",
    "response",
    "all_tables",
    "request_params_table",
    "response_params_table",
];

/// Raw fields extracted from one rendered page, keyed by schema field name
///
/// Values are text, HTML fragments or lists of HTML fragments. Absent fields
/// are simply not present in the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawExtraction {
    fields: BTreeMap<String, Value>,
}

impl RawExtraction {
    /// Builds an extraction from the render service's JSON
    ///
    /// Accepts an object, or an array whose first element is an object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                fields: map.into_iter().collect(),
            }),
            Value::Array(items) => items.into_iter().next().and_then(Self::from_json),
            _ => None,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The field as a string, if present and not blank
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Every non-blank string of a list field; a plain string counts as one item
    pub fn html_list(&self, name: &str) -> Vec<&str> {
        match self.fields.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    /// HTML of the whole page, or the concatenated section fragments
    pub fn page_html(&self) -> Option<Cow<'_, str>> {
        if let Some(page) = self.text("page_content") {
            return Some(Cow::Borrowed(page));
        }

        let joined: String = BODY_FALLBACK_FIELDS
            .iter()
            .flat_map(|name| self.html_list(name))
            .collect();
        (!joined.is_empty()).then_some(Cow::Owned(joined))
    }

    /// True when no field carries any content
    pub fn is_blank(&self) -> bool {
        self.fields.values().all(is_blank_value)
    }
}

fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank_value),
        Value::Object(map) => map.values().all(is_blank_value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
