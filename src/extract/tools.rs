use serde_json::Value;

pub const NO_TOOL_CALLS: &str = "Note - No Tool calls made";

pub fn extract_tools(raw: &str) -> String {
    if raw.trim().is_empty() {
        return NO_TOOL_CALLS.to_string();
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => {
            let names = entries
                .iter()
                .map(tool_entry_text)
                .filter(|name| !name.trim().is_empty())
                .collect::<Vec<String>>();
            if names.is_empty() {
                NO_TOOL_CALLS.to_string()
            } else {
                names.join(", ")
            }
        }
        Ok(Value::String(text)) if text.trim().is_empty() => NO_TOOL_CALLS.to_string(),
        Ok(Value::String(text)) => text,
        Ok(Value::Null) => NO_TOOL_CALLS.to_string(),
        Ok(other) => other.to_string(),
        Err(_) => raw.to_string(),
    }
}

fn tool_entry_text(entry: &Value) -> String {
    match entry {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}
