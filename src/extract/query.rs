use serde_json::Value;

pub const NOT_AVAILABLE: &str = "N/A";

const USER_MESSAGE_PREVIEW_CHARS: usize = 200;

/// How an `inputs.query` payload is laid out. Classification never changes
/// the text returned by [`extract_query`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryShape {
    MessageArray(Vec<Value>),
    Scalar(Value),
    Unparsed,
}

impl QueryShape {
    pub fn classify(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(messages)) => Self::MessageArray(messages),
            Ok(value) => Self::Scalar(value),
            Err(_) => Self::Unparsed,
        }
    }
}

pub fn extract_query(raw: Option<&str>) -> String {
    match raw {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Derives a prompt from a query payload: the first user turn's text when
/// the payload is a transcript, otherwise a preview of the raw value.
pub fn extract_user_message(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    if let QueryShape::MessageArray(messages) = QueryShape::classify(raw) {
        let user_text = messages
            .iter()
            .filter(|message| message.get("role").and_then(Value::as_str) == Some("user"))
            .find_map(|message| message.get("content").and_then(user_content_text));
        if let Some(text) = user_text {
            return text;
        }
    }

    preview(raw)
}

fn user_content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => items
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            .find_map(|item| {
                item.get("text")
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())
            })
            .map(ToOwned::to_owned),
        _ => None,
    }
}

fn preview(raw: &str) -> String {
    match raw.char_indices().nth(USER_MESSAGE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &raw[..cut]),
        None => raw.to_string(),
    }
}
