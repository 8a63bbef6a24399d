use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use super::emit_json;
use crate::aggregate::{AggregateMetric, aggregate, record_pass_count};
use crate::cli::SummaryArgs;
use crate::dataset;
use crate::metric::MetricKey;
use crate::model::EvaluationRecord;
use crate::util::now_utc_string;

#[derive(Debug, Clone, Serialize)]
struct MetricTile {
    metric: MetricKey,
    label: &'static str,
    tile_label: &'static str,
    #[serde(flatten)]
    aggregate: AggregateMetric,
}

#[derive(Debug, Clone, Serialize)]
struct RecordSummary {
    index: usize,
    conversation_id: String,
    metrics_passed: usize,
    metrics_total: usize,
    tiles: BTreeMap<MetricKey, AggregateMetric>,
}

#[derive(Debug, Clone, Serialize)]
struct SummaryReport {
    dataset: String,
    generated_at: String,
    records: usize,
    skipped: usize,
    metrics: Vec<MetricTile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    per_record: Option<Vec<RecordSummary>>,
}

pub fn run(args: SummaryArgs) -> Result<()> {
    let loaded = dataset::load(&args.dataset)?;

    let report = SummaryReport {
        dataset: args.dataset.display().to_string(),
        generated_at: now_utc_string(),
        records: loaded.records.len(),
        skipped: loaded.skipped,
        metrics: metric_tiles(&loaded.records),
        per_record: args.per_record.then(|| record_summaries(&loaded.records)),
    };

    info!(
        records = report.records,
        per_record = args.per_record,
        "summary computed"
    );

    if args.json || args.output.is_some() {
        emit_json(&report, args.output.as_deref())
    } else {
        write_text_report(&report)
    }
}

fn metric_tiles(records: &[EvaluationRecord]) -> Vec<MetricTile> {
    aggregate(records)
        .into_iter()
        .map(|(metric, aggregate)| MetricTile {
            metric,
            label: metric.label(),
            tile_label: metric.tile_label(),
            aggregate,
        })
        .collect()
}

fn record_summaries(records: &[EvaluationRecord]) -> Vec<RecordSummary> {
    records
        .iter()
        .enumerate()
        .map(|(position, record)| RecordSummary {
            index: position + 1,
            conversation_id: record.conversation_id.clone(),
            metrics_passed: record_pass_count(record),
            metrics_total: MetricKey::ALL.len(),
            tiles: aggregate(std::slice::from_ref(record)),
        })
        .collect()
}

fn write_text_report(report: &SummaryReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Dataset: {}", report.dataset)?;
    writeln!(
        output,
        "Records: {} (skipped {})",
        report.records, report.skipped
    )?;
    writeln!(output)?;
    writeln!(
        output,
        "{:<20} {:>9} {:>6}  grade",
        "metric", "passed", "rate"
    )?;

    for tile in &report.metrics {
        writeln!(
            output,
            "{:<20} {:>9} {:>5}%  {}",
            tile.label,
            format!("{}/{}", tile.aggregate.passed, tile.aggregate.total),
            tile.aggregate.percentage,
            tile.aggregate.grade.as_str()
        )?;
    }

    if let Some(rows) = &report.per_record {
        writeln!(output)?;
        for row in rows {
            let outcomes = row
                .tiles
                .iter()
                .map(|(metric, tile)| {
                    let mark = if tile.passed > 0 { "pass" } else { "fail" };
                    format!("{}={mark}", metric.tile_label())
                })
                .collect::<Vec<String>>()
                .join(" ");
            writeln!(
                output,
                "{}.\t{}\t{}/{}\t{}",
                row.index,
                display_id(&row.conversation_id),
                row.metrics_passed,
                row.metrics_total,
                outcomes
            )?;
        }
    }

    output.flush()?;
    Ok(())
}

fn display_id(conversation_id: &str) -> &str {
    if conversation_id.is_empty() {
        "N/A"
    } else {
        conversation_id
    }
}
