use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::extract::extract_user_message;
use crate::metric::MetricKey;
use crate::model::{EvaluationRecord, Outcome, RAW_CONVERSATION_ID, RAW_QUERY, Verdict};
use crate::util::{now_utc_string, sha256_file};

#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub filename: String,
    pub path: String,
    pub exists: bool,
    pub size_bytes: Option<u64>,
    pub sha256: Option<String>,
    pub inspected_at: String,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<EvaluationRecord>,
    pub skipped: usize,
}

pub fn describe(path: &Path) -> Result<DatasetInfo> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (exists, size_bytes, sha256) = if path.is_file() {
        let metadata = fs::metadata(path)
            .with_context(|| format!("failed to stat dataset: {}", path.display()))?;
        (true, Some(metadata.len()), Some(sha256_file(path)?))
    } else {
        (false, None, None)
    };

    Ok(DatasetInfo {
        filename,
        path: path.display().to_string(),
        exists,
        size_bytes,
        sha256,
        inspected_at: now_utc_string(),
    })
}

pub fn load(path: &Path) -> Result<Dataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset: {}", path.display()))?;
    let dataset =
        parse(&raw).with_context(|| format!("failed to parse dataset: {}", path.display()))?;

    info!(
        path = %path.display(),
        records = dataset.records.len(),
        skipped = dataset.skipped,
        "dataset loaded"
    );
    Ok(dataset)
}

/// Accepts a JSON array, an object wrapping a `records` or `runs` array, a
/// single record object, or JSON Lines.
pub fn parse(raw: &str) -> Result<Dataset> {
    let elements = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(elements)) => elements,
        Ok(Value::Object(mut object)) => match wrapped_records(&mut object) {
            Some(elements) => elements,
            None => vec![Value::Object(object)],
        },
        Ok(other) => bail!("expected records, found a bare {}", json_kind(&other)),
        Err(_) => parse_json_lines(raw)?,
    };

    let mut records = Vec::with_capacity(elements.len());
    let mut skipped = 0_usize;
    for (index, element) in elements.iter().enumerate() {
        match record_from_value(element) {
            Some(record) => records.push(record),
            None => {
                warn!(index, kind = json_kind(element), "skipping non-object dataset entry");
                skipped += 1;
            }
        }
    }

    Ok(Dataset { records, skipped })
}

fn wrapped_records(object: &mut Map<String, Value>) -> Option<Vec<Value>> {
    for key in ["records", "runs"] {
        if matches!(object.get(key), Some(Value::Array(_))) {
            if let Some(Value::Array(elements)) = object.remove(key) {
                return Some(elements);
            }
        }
    }
    None
}

fn parse_json_lines(raw: &str) -> Result<Vec<Value>> {
    let mut elements = Vec::new();
    for (line_number, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = serde_json::from_str::<Value>(trimmed)
            .with_context(|| format!("invalid json on line {}", line_number + 1))?;
        elements.push(value);
    }
    Ok(elements)
}

/// Builds a record from either the nested record form or a flat row of
/// dotted evaluation columns. Non-objects yield `None`.
///
/// An object is in record form when it carries a `raw_data` key of any type
/// or an object-valued metric key; a missing or non-object `raw_data` is read
/// as empty.
pub fn record_from_value(value: &Value) -> Option<EvaluationRecord> {
    let object = value.as_object()?;
    if is_record_form(object) {
        Some(record_from_nested(object))
    } else {
        Some(record_from_flat_row(object))
    }
}

fn is_record_form(object: &Map<String, Value>) -> bool {
    object.contains_key("raw_data")
        || object
            .iter()
            .any(|(key, value)| value.is_object() && key.parse::<MetricKey>().is_ok())
}

fn record_from_nested(object: &Map<String, Value>) -> EvaluationRecord {
    let raw_data = match object.get("raw_data") {
        Some(Value::Object(columns)) => raw_columns(columns),
        _ => BTreeMap::new(),
    };

    let conversation_id = object
        .get("conversation_id")
        .and_then(scalar_text)
        .or_else(|| raw_data.get(RAW_CONVERSATION_ID).cloned())
        .unwrap_or_default();

    let prompt = object
        .get("prompt")
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(ToOwned::to_owned);

    let verdicts = object
        .iter()
        .filter_map(|(key, value)| {
            let metric = key.parse::<MetricKey>().ok()?;
            verdict_from_value(value).map(|verdict| (metric, verdict))
        })
        .collect();

    EvaluationRecord {
        conversation_id,
        prompt,
        raw_data,
        verdicts,
    }
}

fn record_from_flat_row(object: &Map<String, Value>) -> EvaluationRecord {
    let raw_data = raw_columns(object);

    let conversation_id = raw_data
        .get(RAW_CONVERSATION_ID)
        .or_else(|| raw_data.get("conversation_id"))
        .cloned()
        .unwrap_or_default();

    let prompt = raw_data
        .get("prompt")
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .or_else(|| {
            raw_data
                .get(RAW_QUERY)
                .map(|query| extract_user_message(query))
                .filter(|value| !value.trim().is_empty())
        });

    let mut verdicts = BTreeMap::new();
    for metric in MetricKey::ALL {
        let Some(result) = raw_data
            .get(&metric.raw_key("result"))
            .filter(|value| !value.trim().is_empty())
        else {
            continue;
        };

        verdicts.insert(
            metric,
            Verdict {
                result: Outcome::from_label(result),
                reason: raw_data
                    .get(&metric.raw_key("reason"))
                    .cloned()
                    .unwrap_or_default(),
                score: raw_data
                    .get(&metric.raw_key("score"))
                    .and_then(|value| parse_score(value)),
            },
        );
    }

    debug!(
        conversation_id = %conversation_id,
        columns = raw_data.len(),
        verdicts = verdicts.len(),
        "built record from flat row"
    );

    EvaluationRecord {
        conversation_id,
        prompt,
        raw_data,
        verdicts,
    }
}

fn verdict_from_value(value: &Value) -> Option<Verdict> {
    let object = value.as_object()?;
    let result = object
        .get("result")
        .and_then(scalar_text)
        .map(|label| Outcome::from_label(&label))
        .unwrap_or(Outcome::Fail);

    Some(Verdict {
        result,
        reason: object
            .get("reason")
            .and_then(scalar_text)
            .unwrap_or_default(),
        score: object.get("score").and_then(score_value),
    })
}

fn raw_columns(object: &Map<String, Value>) -> BTreeMap<String, String> {
    object
        .iter()
        .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
        .collect()
}

/// Text form of a column value. Nested values are re-encoded, since raw
/// columns are expected to hold JSON text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn score_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_score(text),
        _ => None,
    }
}

fn parse_score(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::{describe, load, parse, record_from_value};
    use crate::metric::MetricKey;
    use crate::model::Outcome;

    #[test]
    fn nested_record_form_is_read_as_is() {
        let value = json!({
            "conversation_id": "conv-7",
            "prompt": "Why did the deploy fail?",
            "raw_data": {
                "inputs.response": "[{\"role\":\"assistant\",\"content\":\"Bad image tag.\"}]",
                "inputs.tools_used": "[\"logs\"]",
                "coherence.coherence.score": 4
            },
            "coherence": {"result": "Pass", "reason": "Clear.", "score": 4},
            "fluency": {"result": "fail", "reason": "Terse.", "score": "2.5"},
            "toolCallAccuracy": {"result": "PASS", "reason": "Right tool."},
            "relevance": "not an object",
            "notes": {"result": "Pass"}
        });

        let record = record_from_value(&value).expect("object should convert");
        assert_eq!(record.conversation_id, "conv-7");
        assert_eq!(record.prompt.as_deref(), Some("Why did the deploy fail?"));
        assert_eq!(record.raw("coherence.coherence.score"), Some("4"));
        assert_eq!(record.verdicts.len(), 3);
        assert!(record.passed(MetricKey::Coherence));
        assert!(record.passed(MetricKey::ToolCallAccuracy));
        assert!(!record.passed(MetricKey::Fluency));
        assert!(!record.passed(MetricKey::Relevance));
        assert_eq!(
            record.verdict(MetricKey::Fluency).and_then(|verdict| verdict.score),
            Some(2.5)
        );
    }

    #[test]
    fn record_form_without_raw_data_keeps_verdicts() {
        for value in [
            json!({
                "conversation_id": "conv-1",
                "prompt": "hi",
                "coherence": {"result": "Pass", "reason": "ok"}
            }),
            json!({
                "conversation_id": "conv-1",
                "prompt": "hi",
                "raw_data": null,
                "coherence": {"result": "Pass", "reason": "ok"}
            }),
        ] {
            let record = record_from_value(&value).expect("object should convert");
            assert_eq!(record.conversation_id, "conv-1");
            assert_eq!(record.prompt.as_deref(), Some("hi"));
            assert!(record.raw_data.is_empty());
            assert!(record.passed(MetricKey::Coherence));
            assert_eq!(
                record.verdict(MetricKey::Coherence).map(|verdict| verdict.reason.as_str()),
                Some("ok")
            );
        }
    }

    #[test]
    fn nested_record_falls_back_to_raw_conversation_id() {
        let value = json!({
            "raw_data": {"inputs.conversation_id": "conv-raw"}
        });
        let record = record_from_value(&value).expect("object should convert");
        assert_eq!(record.conversation_id, "conv-raw");
        assert!(record.prompt.is_none());
        assert!(record.verdicts.is_empty());
    }

    #[test]
    fn flat_rows_build_verdicts_from_dotted_columns() {
        let value = json!({
            "inputs.conversation_id": "conv-9",
            "inputs.query": "[{\"role\":\"system\",\"content\":\"sre\"},{\"role\":\"user\",\"content\":\"Is the API healthy?\"}]",
            "inputs.response": "{\"role\":\"assistant\",\"content\":\"Yes.\"}",
            "intent_resolution.intent_resolution.result": "pass",
            "intent_resolution.intent_resolution.reason": "Answered directly.",
            "intent_resolution.intent_resolution.score": "5",
            "groundedness.groundedness.result": "Fail",
            "groundedness.groundedness.score": 2,
            "fluency.fluency.result": "",
            "outputs.extra": null
        });

        let record = record_from_value(&value).expect("object should convert");
        assert_eq!(record.conversation_id, "conv-9");
        assert_eq!(record.prompt.as_deref(), Some("Is the API healthy?"));
        assert!(record.raw("outputs.extra").is_none());

        let intent = record
            .verdict(MetricKey::IntentResolution)
            .expect("intent verdict");
        assert_eq!(intent.result, Outcome::Pass);
        assert_eq!(intent.reason, "Answered directly.");
        assert_eq!(intent.score, Some(5.0));

        let grounded = record
            .verdict(MetricKey::Groundedness)
            .expect("groundedness verdict");
        assert_eq!(grounded.result, Outcome::Fail);
        assert_eq!(grounded.reason, "");
        assert_eq!(grounded.score, Some(2.0));

        assert!(record.verdict(MetricKey::Fluency).is_none());
        assert!(record.verdict(MetricKey::Coherence).is_none());
    }

    #[test]
    fn parse_accepts_arrays_wrappers_and_json_lines() {
        let array = parse(r#"[{"conversation_id":"a","raw_data":{}}, 3, {"inputs.conversation_id":"b"}]"#)
            .expect("array dataset");
        assert_eq!(array.records.len(), 2);
        assert_eq!(array.skipped, 1);

        let wrapped = parse(r#"{"runs":[{"conversation_id":"a","raw_data":{}}]}"#)
            .expect("wrapped dataset");
        assert_eq!(wrapped.records.len(), 1);

        let lines = parse("{\"inputs.conversation_id\":\"a\"}\n\n{\"inputs.conversation_id\":\"b\"}\n")
            .expect("json lines dataset");
        let ids = lines
            .records
            .iter()
            .map(|record| record.conversation_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn parse_rejects_unreadable_input() {
        let error = parse("{\"a\":1}\n{broken").expect_err("broken line should fail");
        assert!(
            format!("{error:#}").contains("line 2"),
            "unexpected error: {error:#}"
        );
        assert!(parse("42").is_err());
    }

    #[test]
    fn load_and_describe_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"[{{"conversation_id":"a","raw_data":{{}},"coherence":{{"result":"Pass","reason":"ok"}}}}]"#
        )
        .expect("write dataset");

        let dataset = load(file.path()).expect("dataset should load");
        assert_eq!(dataset.records.len(), 1);
        assert!(dataset.records[0].passed(MetricKey::Coherence));

        let info = describe(file.path()).expect("describe should succeed");
        assert!(info.exists);
        assert_eq!(info.sha256.as_ref().map(String::len), Some(64));
        assert!(info.size_bytes.unwrap_or_default() > 0);

        let missing = describe(&file.path().with_extension("missing")).expect("describe missing");
        assert!(!missing.exists);
        assert!(missing.sha256.is_none());
        assert!(load(&file.path().with_extension("missing")).is_err());
    }
}
