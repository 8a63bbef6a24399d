use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use super::emit_json;
use crate::cli::DrilldownArgs;
use crate::dataset;
use crate::drilldown::{DrilldownSummary, Scope, project};
use crate::metric::MetricKey;
use crate::model::DetailRow;

#[derive(Debug, Clone, Serialize)]
struct DrilldownReport {
    metric: MetricKey,
    label: &'static str,
    scope: String,
    summary: DrilldownSummary,
    rows: Vec<DetailRow>,
}

pub fn run(args: DrilldownArgs) -> Result<()> {
    // Reject a bad metric before touching the dataset.
    let metric = args
        .metric
        .parse::<MetricKey>()
        .context("invalid --metric argument")?;

    let loaded = dataset::load(&args.dataset)?;
    let scope = Scope::parse(&args.scope);
    let selected = scope.select(&loaded.records)?;
    let rows = project(&selected, metric);

    let report = DrilldownReport {
        metric,
        label: metric.label(),
        scope: scope.label().to_string(),
        summary: DrilldownSummary::from_rows(&rows),
        rows,
    };

    info!(
        metric = %report.metric,
        scope = %report.scope,
        passed = report.summary.passed,
        total = report.summary.total,
        "drilldown computed"
    );

    if args.json || args.output.is_some() {
        emit_json(&report, args.output.as_deref())
    } else {
        write_text_report(&report)
    }
}

fn write_text_report(report: &DrilldownReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    let heading = match report.scope.as_str() {
        "all" => "Aggregated Analysis".to_string(),
        scope => format!("Analysis for {scope}"),
    };
    writeln!(output, "{} ({heading})", report.label)?;
    writeln!(
        output,
        "Summary: {} passed, {} failed out of {} evaluations",
        report.summary.passed, report.summary.failed, report.summary.total
    )?;

    for row in &report.rows {
        writeln!(output)?;
        writeln!(
            output,
            "{}.\t{}\t{}",
            row.index,
            if row.passed { "PASS" } else { "FAIL" },
            row.conversation_id
        )?;
        writeln!(output, "\tprompt: {}", row.prompt_text)?;
        writeln!(output, "\tresponse: {}", row.extracted_response_text)?;
        writeln!(output, "\treason: {}", row.reason)?;
    }

    output.flush()?;
    Ok(())
}
