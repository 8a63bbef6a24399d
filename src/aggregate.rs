use std::collections::BTreeMap;

use serde::Serialize;

use crate::metric::MetricKey;
use crate::model::EvaluationRecord;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl Grade {
    pub fn for_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Fair,
            20..=39 => Self::Poor,
            _ => Self::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Critical => "critical",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AggregateMetric {
    pub passed: usize,
    pub total: usize,
    pub percentage: u32,
    pub grade: Grade,
}

impl AggregateMetric {
    pub fn from_counts(passed: usize, total: usize) -> Self {
        let percentage = pass_percentage(passed, total);
        Self {
            passed,
            total,
            percentage,
            grade: Grade::for_percentage(percentage),
        }
    }
}

/// `round(passed / total * 100)` with halves rounded up; 0 for an empty
/// collection.
pub fn pass_percentage(passed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = (passed as u128 * 200 + total as u128) / (total as u128 * 2);
    scaled.min(100) as u32
}

pub fn aggregate(records: &[EvaluationRecord]) -> BTreeMap<MetricKey, AggregateMetric> {
    MetricKey::ALL
        .iter()
        .map(|&metric| (metric, aggregate_metric(records, metric)))
        .collect()
}

pub fn aggregate_metric(records: &[EvaluationRecord], metric: MetricKey) -> AggregateMetric {
    let passed = records.iter().filter(|record| record.passed(metric)).count();
    AggregateMetric::from_counts(passed, records.len())
}

/// Metrics passed by a single conversation, out of the full metric set.
pub fn record_pass_count(record: &EvaluationRecord) -> usize {
    MetricKey::ALL
        .iter()
        .filter(|&&metric| record.passed(metric))
        .count()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::{AggregateMetric, Grade, aggregate, pass_percentage, record_pass_count};
    use crate::metric::MetricKey;
    use crate::model::{EvaluationRecord, Outcome, Verdict};

    fn record_with(outcomes: &[(MetricKey, Outcome)]) -> EvaluationRecord {
        EvaluationRecord {
            conversation_id: "conv".to_string(),
            verdicts: outcomes
                .iter()
                .map(|&(metric, result)| {
                    (
                        metric,
                        Verdict {
                            result,
                            reason: String::new(),
                            score: None,
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
            ..EvaluationRecord::default()
        }
    }

    #[test]
    fn seven_of_ten_intent_passes() {
        let records = (0..10)
            .map(|index| {
                let outcome = if index < 7 { Outcome::Pass } else { Outcome::Fail };
                record_with(&[(MetricKey::IntentResolution, outcome)])
            })
            .collect::<Vec<_>>();

        let summary = aggregate(&records);
        let intent = summary[&MetricKey::IntentResolution];
        assert_eq!((intent.passed, intent.total, intent.percentage), (7, 10, 70));
        assert_eq!(intent.grade, Grade::Good);

        // Records without a verdict still count toward the total.
        let fluency = summary[&MetricKey::Fluency];
        assert_eq!((fluency.passed, fluency.total, fluency.percentage), (0, 10, 0));
    }

    #[test]
    fn empty_collection_is_zero_percent_everywhere() {
        let summary = aggregate(&[]);
        assert_eq!(summary.len(), MetricKey::ALL.len());
        for metric in summary.values() {
            assert_eq!(*metric, AggregateMetric::from_counts(0, 0));
            assert_eq!(metric.percentage, 0);
            assert_eq!(metric.grade, Grade::Critical);
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(pass_percentage(1, 3), 33);
        assert_eq!(pass_percentage(2, 3), 67);
        assert_eq!(pass_percentage(1, 8), 13);
        assert_eq!(pass_percentage(1, 200), 1);
        assert_eq!(pass_percentage(5, 5), 100);
    }

    #[test]
    fn grade_bucket_boundaries() {
        assert_eq!(Grade::for_percentage(100), Grade::Excellent);
        assert_eq!(Grade::for_percentage(80), Grade::Excellent);
        assert_eq!(Grade::for_percentage(79), Grade::Good);
        assert_eq!(Grade::for_percentage(40), Grade::Fair);
        assert_eq!(Grade::for_percentage(20), Grade::Poor);
        assert_eq!(Grade::for_percentage(19), Grade::Critical);
    }

    #[test]
    fn record_pass_count_ignores_missing_verdicts() {
        let record = record_with(&[
            (MetricKey::Coherence, Outcome::Pass),
            (MetricKey::Fluency, Outcome::Pass),
            (MetricKey::Relevance, Outcome::Fail),
        ]);
        assert_eq!(record_pass_count(&record), 2);
    }

    fn outcome_strategy() -> impl Strategy<Value = Vec<Option<bool>>> {
        prop::collection::vec(prop::option::of(any::<bool>()), MetricKey::ALL.len())
    }

    fn build(rows: &[Vec<Option<bool>>]) -> Vec<EvaluationRecord> {
        rows.iter()
            .map(|row| {
                let outcomes = MetricKey::ALL
                    .iter()
                    .zip(row)
                    .filter_map(|(&metric, value)| {
                        value.map(|pass| {
                            (metric, if pass { Outcome::Pass } else { Outcome::Fail })
                        })
                    })
                    .collect::<Vec<_>>();
                record_with(&outcomes)
            })
            .collect()
    }

    proptest! {
        #[test]
        fn totals_bounds_and_rounding_hold(rows in prop::collection::vec(outcome_strategy(), 0..40)) {
            let records = build(&rows);
            for (metric, summary) in aggregate(&records) {
                prop_assert_eq!(summary.total, records.len());
                prop_assert!(summary.passed <= summary.total);
                prop_assert!(summary.percentage <= 100);
                let expected = if summary.total == 0 {
                    0
                } else {
                    (summary.passed as f64 / summary.total as f64 * 100.0).round() as u32
                };
                prop_assert_eq!(summary.percentage, expected, "metric {}", metric);
            }
        }

        #[test]
        fn aggregation_is_order_invariant(
            rows in prop::collection::vec(outcome_strategy(), 1..30),
            rotation in 0usize..30,
        ) {
            let records = build(&rows);
            let mut permuted = records.clone();
            permuted.reverse();
            let shift = rotation % permuted.len();
            permuted.rotate_left(shift);
            prop_assert_eq!(aggregate(&records), aggregate(&permuted));
        }
    }
}
