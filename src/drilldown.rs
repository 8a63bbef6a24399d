use std::borrow::Cow;

use serde::Serialize;

use crate::error::CoreError;
use crate::extract::extract_response;
use crate::metric::MetricKey;
use crate::model::{DetailRow, EvaluationRecord, RAW_RESPONSE};

pub const NO_PROMPT: &str = "No prompt available";
pub const NO_REASON: &str = "No reason available";
pub const UNKNOWN_CONVERSATION: &str = "N/A";

/// Which records a drilldown covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Conversation(String),
}

impl Scope {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Conversation(trimmed.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Conversation(id) => id,
        }
    }

    /// Conversation scopes match on `conversation_id` first, then fall back
    /// to a 1-based position written as `run_<n>`, `prompt_<n>` or `<n>`.
    pub fn select<'a>(
        &self,
        records: &'a [EvaluationRecord],
    ) -> Result<Cow<'a, [EvaluationRecord]>, CoreError> {
        let Self::Conversation(id) = self else {
            return Ok(Cow::Borrowed(records));
        };

        let matched = records
            .iter()
            .filter(|record| record.conversation_id == *id)
            .cloned()
            .collect::<Vec<EvaluationRecord>>();
        if !matched.is_empty() {
            return Ok(Cow::Owned(matched));
        }

        positional_index(id)
            .filter(|index| *index < records.len())
            .map(|index| Cow::Borrowed(&records[index..=index]))
            .ok_or_else(|| CoreError::EmptyScope(id.clone()))
    }
}

fn positional_index(id: &str) -> Option<usize> {
    let digits = id
        .strip_prefix("run_")
        .or_else(|| id.strip_prefix("prompt_"))
        .unwrap_or(id);
    digits.parse::<usize>().ok()?.checked_sub(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrilldownSummary {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl DrilldownSummary {
    pub fn from_rows(rows: &[DetailRow]) -> Self {
        let passed = rows.iter().filter(|row| row.passed).count();
        Self {
            passed,
            failed: rows.len() - passed,
            total: rows.len(),
        }
    }
}

pub fn project(records: &[EvaluationRecord], metric: MetricKey) -> Vec<DetailRow> {
    records
        .iter()
        .enumerate()
        .map(|(position, record)| detail_row(position + 1, record, metric))
        .collect()
}

fn detail_row(index: usize, record: &EvaluationRecord, metric: MetricKey) -> DetailRow {
    let verdict = record.verdict(metric);
    let reason = verdict
        .map(|value| value.reason.as_str())
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(NO_REASON);

    DetailRow {
        index,
        conversation_id: if record.conversation_id.is_empty() {
            UNKNOWN_CONVERSATION.to_string()
        } else {
            record.conversation_id.clone()
        },
        prompt_text: record.prompt_text().unwrap_or(NO_PROMPT).to_string(),
        extracted_response_text: extract_response(record.raw(RAW_RESPONSE).unwrap_or_default()),
        passed: record.passed(metric),
        reason: reason.to_string(),
    }
}
