//! JSON inspection payloads for a single conversation: the raw artifacts
//! re-parsed and annotated with the related `raw_data` columns.

use serde_json::{Value, json};

use crate::extract::{NOT_AVAILABLE, QueryShape};
use crate::metric::MetricKey;
use crate::model::{
    EvaluationRecord, RAW_CONVERSATION_ID, RAW_QUERY, RAW_RESPONSE, RAW_TOOL_DEFINITIONS,
    RAW_TOOLS_USED,
};

const PARSE_FAILURE: &str = "Could not parse as JSON";
const TOOLS_PARSE_FAILURE: &str = "Could not parse tools JSON";

pub fn query_view(record: &EvaluationRecord) -> Value {
    let raw = record.raw(RAW_QUERY).unwrap_or_default();
    let conversation_id = raw_conversation_id(record);
    let related_fields =
        related_fields(record, |key| key.contains("query") || key.contains("conversation"));

    match QueryShape::classify(raw) {
        QueryShape::MessageArray(messages) => {
            let structure = messages
                .iter()
                .enumerate()
                .map(|(index, message)| message_summary(index, message))
                .collect::<Vec<Value>>();
            json!({
                "conversation_structure": structure,
                "conversation_id": conversation_id,
                "related_fields": related_fields,
            })
        }
        QueryShape::Scalar(value) => json!({
            "query_content": value,
            "conversation_id": conversation_id,
            "related_fields": related_fields,
        }),
        QueryShape::Unparsed => json!({
            "raw_query": raw,
            "parsing_error": PARSE_FAILURE,
            "conversation_id": conversation_id,
            "related_fields": related_fields,
        }),
    }
}

pub fn response_view(record: &EvaluationRecord) -> Value {
    let raw = record.raw(RAW_RESPONSE).unwrap_or_default();
    let related_fields = related_fields(record, |key| key.contains("response"));
    let tools_raw = record.raw(RAW_TOOLS_USED).filter(|value| !value.is_empty());

    match serde_json::from_str::<Value>(raw) {
        Ok(parsed) => {
            let tools_used = match tools_raw {
                Some(tools) => serde_json::from_str::<Value>(tools)
                    .unwrap_or_else(|_| Value::String(tools.to_string())),
                None => Value::String(NOT_AVAILABLE.to_string()),
            };
            json!({
                "response_structure": parsed,
                "tools_used": tools_used,
                "related_fields": related_fields,
            })
        }
        Err(_) => json!({
            "raw_response": raw,
            "parsing_error": PARSE_FAILURE,
            "tools_used": tools_raw.unwrap_or(NOT_AVAILABLE),
            "related_fields": related_fields,
        }),
    }
}

pub fn tools_view(record: &EvaluationRecord) -> Value {
    let tools_raw = record.raw(RAW_TOOLS_USED).unwrap_or_default();
    let definitions_raw = record.raw(RAW_TOOL_DEFINITIONS).unwrap_or_default();
    let conversation_id = raw_conversation_id(record);
    let related_fields = related_fields(record, |key| key.contains("tool"));

    match (parse_optional(tools_raw), parse_optional(definitions_raw)) {
        (Ok(tools_used), Ok(tool_definitions)) => json!({
            "tools_used": tools_used,
            "tool_definitions": tool_definitions,
            "conversation_id": conversation_id,
            "related_fields": related_fields,
        }),
        _ => json!({
            "tools_used_raw": tools_raw,
            "tool_definitions_raw": definitions_raw,
            "parsing_error": TOOLS_PARSE_FAILURE,
            "conversation_id": conversation_id,
            "related_fields": related_fields,
        }),
    }
}

pub fn metric_view(record: &EvaluationRecord, metric: MetricKey) -> Value {
    let field = |name: &str| {
        record
            .raw(&metric.raw_key(name))
            .filter(|value| !value.is_empty())
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    };

    let available_fields = record
        .raw_data
        .keys()
        .filter(|key| key.starts_with(metric.as_str()))
        .collect::<Vec<&String>>();

    json!({
        "metric": metric.as_str(),
        "result": field("result"),
        "score": field("score"),
        "reason": field("reason"),
        "raw_key_prefix": metric.raw_key_prefix(),
        "available_fields": available_fields,
    })
}

fn message_summary(index: usize, message: &Value) -> Value {
    let content = message.get("content").cloned().unwrap_or(Value::Null);
    json!({
        "message_index": index + 1,
        "role": message.get("role").and_then(Value::as_str).unwrap_or("unknown"),
        "content_type": content_type(&content),
        "content": content,
    })
}

fn parse_optional(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(raw)
    }
}

fn raw_conversation_id(record: &EvaluationRecord) -> &str {
    record
        .raw(RAW_CONVERSATION_ID)
        .filter(|value| !value.is_empty())
        .unwrap_or(NOT_AVAILABLE)
}

fn related_fields(record: &EvaluationRecord, keep: impl Fn(&str) -> bool) -> Vec<&str> {
    record
        .raw_data
        .keys()
        .map(String::as_str)
        .filter(|key| key.starts_with("inputs.") && keep(key))
        .collect()
}

fn content_type(content: &Value) -> &'static str {
    match content {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "undefined",
        Value::Array(_) | Value::Object(_) => "object",
    }
}
