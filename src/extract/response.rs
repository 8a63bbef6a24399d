use serde_json::Value;
use tracing::debug;

use super::recovery::recover_assistant_text;

pub const NO_ASSISTANT_RESPONSE: &str = "No assistant response found";
pub const NO_RESPONSE_DATA: &str = "No response data available";

/// Recognized layouts of an `inputs.response` payload after a successful
/// JSON parse.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// A transcript of role-tagged messages.
    MessageArray(Vec<Value>),
    /// One `{"role": "assistant", "content": ...}` message; holds the content.
    SingleMessage(Value),
    /// A role-less object carrying `content`.
    ContentOnly(Value),
    /// An object carrying a plain `text` field.
    TextOnly(String),
    Unrecognized,
}

impl ResponseShape {
    pub fn classify(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return match value {
                Value::Array(messages) => Self::MessageArray(messages),
                _ => Self::Unrecognized,
            };
        };

        match object.get("role") {
            Some(role) if role.as_str() == Some("assistant") => {
                return Self::SingleMessage(object.remove("content").unwrap_or(Value::Null));
            }
            // Empty content falls through to the `text` field.
            None => {
                if let Some(content) = object.remove("content") {
                    if content_text(&content).is_some() {
                        return Self::ContentOnly(content);
                    }
                }
            }
            Some(_) => {}
        }

        match object.remove("text") {
            Some(Value::String(text)) => Self::TextOnly(text),
            _ => Self::Unrecognized,
        }
    }

    /// Text of the most recent assistant turn, if any.
    pub fn assistant_text(&self) -> Option<String> {
        match self {
            Self::MessageArray(messages) => messages
                .iter()
                .rev()
                .filter(|message| is_assistant(message))
                .find_map(|message| message.get("content").and_then(content_text)),
            Self::SingleMessage(content) | Self::ContentOnly(content) => content_text(content),
            Self::TextOnly(text) => non_empty(text),
            Self::Unrecognized => None,
        }
    }
}

pub fn extract_response(raw: &str) -> String {
    if raw.trim().is_empty() {
        return NO_RESPONSE_DATA.to_string();
    }

    let structured = match serde_json::from_str::<Value>(raw) {
        Ok(value) => ResponseShape::classify(value).assistant_text(),
        Err(error) => {
            debug!(error = %error, "response payload is not valid json");
            None
        }
    };

    structured
        .or_else(|| recover_assistant_text(raw))
        .unwrap_or_else(|| NO_ASSISTANT_RESPONSE.to_string())
}

/// Resolves a message `content` value to display text.
pub fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => non_empty(text),
        Value::Array(items) => items
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            .find_map(|item| item.get("text").and_then(Value::as_str).and_then(non_empty))
            .or_else(|| items.iter().find_map(|item| item.as_str().and_then(non_empty))),
        Value::Object(object) => object.get("text").and_then(Value::as_str).and_then(non_empty),
        _ => None,
    }
}

fn is_assistant(message: &Value) -> bool {
    message.get("role").and_then(Value::as_str) == Some("assistant")
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
