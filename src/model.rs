use std::collections::BTreeMap;

use serde::Serialize;

use crate::metric::MetricKey;

pub const RAW_QUERY: &str = "inputs.query";
pub const RAW_RESPONSE: &str = "inputs.response";
pub const RAW_TOOLS_USED: &str = "inputs.tools_used";
pub const RAW_TOOL_DEFINITIONS: &str = "inputs.tool_definitions";
pub const RAW_CONVERSATION_ID: &str = "inputs.conversation_id";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    /// Evaluator output is not normalized; only a case-insensitive `pass`
    /// counts as a pass.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("pass") {
            Self::Pass
        } else {
            Self::Fail
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub result: Outcome,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        self.result == Outcome::Pass
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub raw_data: BTreeMap<String, String>,
    pub verdicts: BTreeMap<MetricKey, Verdict>,
}

impl EvaluationRecord {
    pub fn verdict(&self, metric: MetricKey) -> Option<&Verdict> {
        self.verdicts.get(&metric)
    }

    /// Absent verdicts count as not passed.
    pub fn passed(&self, metric: MetricKey) -> bool {
        self.verdict(metric).is_some_and(Verdict::is_pass)
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.raw_data.get(key).map(String::as_str)
    }

    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedContent {
    pub query_text: String,
    pub response_text: String,
    pub tools_used_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub index: usize,
    pub conversation_id: String,
    pub prompt_text: String,
    pub extracted_response_text: String,
    pub passed: bool,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::{Outcome, Verdict};

    #[test]
    fn verdict_serializes_without_absent_score() {
        let verdict = Verdict {
            result: Outcome::from_label(" PASS "),
            reason: "Clear.".to_string(),
            score: None,
        };
        let json = serde_json::to_value(&verdict).expect("verdict serializes");
        assert_eq!(json, serde_json::json!({"result": "Pass", "reason": "Clear."}));
    }
}
