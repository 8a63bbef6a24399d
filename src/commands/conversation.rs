use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::emit_json;
use crate::aggregate::record_pass_count;
use crate::cli::ConversationArgs;
use crate::dataset;
use crate::drilldown::Scope;
use crate::extract::extract_content;
use crate::metric::MetricKey;
use crate::model::{EvaluationRecord, ExtractedContent, Outcome};
use crate::structured::{metric_view, query_view, response_view, tools_view};

const NO_REASON_PROVIDED: &str = "No reason provided";

#[derive(Debug, Clone, Serialize)]
struct VerdictRow {
    metric: MetricKey,
    label: &'static str,
    status: Outcome,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
struct StructuredViews {
    query: Value,
    response: Value,
    tools: Value,
    metrics: BTreeMap<MetricKey, Value>,
}

#[derive(Debug, Clone, Serialize)]
struct ConversationReport {
    conversation_id: String,
    metrics_passed: usize,
    metrics_total: usize,
    content: ExtractedContent,
    verdicts: Vec<VerdictRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    views: Option<StructuredViews>,
}

pub fn run(args: ConversationArgs) -> Result<()> {
    let loaded = dataset::load(&args.dataset)?;
    let scope = Scope::Conversation(args.conversation.trim().to_string());
    let selected = scope.select(&loaded.records)?;

    let reports = selected
        .iter()
        .map(|record| conversation_report(record, args.views))
        .collect::<Vec<ConversationReport>>();

    info!(
        conversation = %args.conversation,
        matches = reports.len(),
        "conversation detail computed"
    );

    if args.json {
        emit_json(&reports, None)
    } else {
        write_text_report(&reports)
    }
}

fn conversation_report(record: &EvaluationRecord, with_views: bool) -> ConversationReport {
    let verdicts = MetricKey::ALL
        .iter()
        .map(|&metric| {
            let verdict = record.verdict(metric);
            VerdictRow {
                metric,
                label: metric.label(),
                status: if record.passed(metric) {
                    Outcome::Pass
                } else {
                    Outcome::Fail
                },
                reason: verdict
                    .map(|value| value.reason.as_str())
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or(NO_REASON_PROVIDED)
                    .to_string(),
                score: verdict.and_then(|value| value.score),
            }
        })
        .collect();

    let views = with_views.then(|| StructuredViews {
        query: query_view(record),
        response: response_view(record),
        tools: tools_view(record),
        metrics: MetricKey::ALL
            .iter()
            .map(|&metric| (metric, metric_view(record, metric)))
            .collect(),
    });

    ConversationReport {
        conversation_id: record.conversation_id.clone(),
        metrics_passed: record_pass_count(record),
        metrics_total: MetricKey::ALL.len(),
        content: extract_content(record),
        verdicts,
        views,
    }
}

fn write_text_report(reports: &[ConversationReport]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    for (position, report) in reports.iter().enumerate() {
        if position > 0 {
            writeln!(output)?;
        }
        writeln!(output, "Conversation ID: {}", report.conversation_id)?;
        writeln!(
            output,
            "Passed: {}/{}",
            report.metrics_passed, report.metrics_total
        )?;
        writeln!(output, "Query: {}", report.content.query_text)?;
        writeln!(output, "Response: {}", report.content.response_text)?;
        writeln!(output, "Tool calls: {}", report.content.tools_used_text)?;
        writeln!(output)?;

        for row in &report.verdicts {
            writeln!(
                output,
                "{:<20} {:<5} {}",
                row.label,
                row.status.as_str(),
                row.reason
            )?;
        }

        if let Some(views) = &report.views {
            writeln!(output)?;
            writeln!(output, "Query JSON:")?;
            writeln!(output, "{}", serde_json::to_string_pretty(&views.query)?)?;
            writeln!(output, "Response JSON:")?;
            writeln!(output, "{}", serde_json::to_string_pretty(&views.response)?)?;
            writeln!(output, "Tools JSON:")?;
            writeln!(output, "{}", serde_json::to_string_pretty(&views.tools)?)?;
        }
    }

    output.flush()?;
    Ok(())
}
