//! Coerces loosely shaped persisted history into canonical [`Message`]s.
//!
//! Front-ends hand back whatever they stored: role/content objects, legacy
//! `[user, assistant]` pairs, or junk. Every entry is classified once at the
//! boundary and everything downstream works on `Vec<Message>`.

use serde_json::Value;

use crate::session::{Message, Role};

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Canonical { role: Role, content: String },
    LegacyPair { user: Option<String>, assistant: Option<String> },
    Unrecognized,
}

impl HistoryEntry {
    pub fn from_value(v: &Value) -> Self {
        match v {
            Value::Object(map) => {
                let role = map.get("role").and_then(Value::as_str).and_then(Role::parse);
                let content = map.get("content").filter(|c| !c.is_null());
                match (role, content) {
                    (Some(role), Some(content)) => HistoryEntry::Canonical { role, content: text_of(content) },
                    _ => HistoryEntry::Unrecognized,
                }
            }
            Value::Array(items) if items.len() == 2 => HistoryEntry::LegacyPair {
                user: Some(&items[0]).filter(|v| truthy(v)).map(text_of),
                assistant: Some(&items[1]).filter(|v| truthy(v)).map(text_of),
            },
            _ => HistoryEntry::Unrecognized,
        }
    }
}

impl From<Message> for HistoryEntry {
    fn from(m: Message) -> Self {
        HistoryEntry::Canonical { role: m.role, content: m.content }
    }
}

impl From<&Value> for HistoryEntry {
    fn from(v: &Value) -> Self { Self::from_value(v) }
}

/// Flattens entries into canonical order. Unrecognized entries and empty content vanish silently.
pub fn normalize<I>(entries: I) -> Vec<Message>
where
    I: IntoIterator,
    I::Item: Into<HistoryEntry>,
{
    let mut out = Vec::new();
    for entry in entries {
        match entry.into() {
            HistoryEntry::Canonical { role, content } => {
                if !content.is_empty() {
                    out.push(Message { role, content });
                }
            }
            HistoryEntry::LegacyPair { user, assistant } => {
                if let Some(u) = user {
                    out.push(Message::user(u));
                }
                if let Some(b) = assistant {
                    out.push(Message::assistant(b));
                }
            }
            HistoryEntry::Unrecognized => {}
        }
    }
    out
}

pub fn normalize_values(values: &[Value]) -> Vec<Message> {
    normalize(values.iter())
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Non-string content takes its JSON spelling (`true`, `3.5`, `{"a":1}`).
fn text_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
