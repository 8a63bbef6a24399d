use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::dataset::{self, Dataset};
use crate::metric::MetricKey;

pub fn run(args: StatusArgs) -> Result<()> {
    let info = dataset::describe(&args.dataset)?;

    info!(
        filename = %info.filename,
        path = %info.path,
        exists = info.exists,
        size_bytes = info.size_bytes.unwrap_or_default(),
        sha256 = %info.sha256.as_deref().unwrap_or_default(),
        inspected_at = %info.inspected_at,
        "dataset status"
    );

    if !info.exists {
        warn!(path = %info.path, "dataset file missing");
        return Ok(());
    }

    let loaded = dataset::load(&args.dataset)?;
    for (metric, with_verdict) in verdict_coverage(&loaded) {
        let missing = loaded.records.len() - with_verdict;
        if missing > 0 {
            warn!(
                metric = %metric,
                missing,
                "records without a verdict count as failed"
            );
        } else {
            info!(metric = %metric, records = with_verdict, "verdict coverage complete");
        }
    }

    Ok(())
}

/// Number of records carrying a verdict, per metric.
fn verdict_coverage(dataset: &Dataset) -> Vec<(MetricKey, usize)> {
    MetricKey::ALL
        .iter()
        .map(|&metric| {
            let count = dataset
                .records
                .iter()
                .filter(|record| record.verdict(metric).is_some())
                .count();
            (metric, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::verdict_coverage;
    use crate::dataset::parse;
    use crate::metric::MetricKey;

    #[test]
    fn coverage_counts_records_with_verdicts() {
        let dataset = parse(
            r#"[
                {"inputs.conversation_id": "a", "coherence.coherence.result": "pass"},
                {"inputs.conversation_id": "b", "coherence.coherence.result": "fail",
                 "fluency.fluency.result": "pass"}
            ]"#,
        )
        .expect("dataset parses");

        let coverage = verdict_coverage(&dataset);
        assert_eq!(coverage.len(), 7);
        assert!(coverage.contains(&(MetricKey::Coherence, 2)));
        assert!(coverage.contains(&(MetricKey::Fluency, 1)));
        assert!(coverage.contains(&(MetricKey::Relevance, 0)));
    }
}
