use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

/// The seven quality dimensions scored for every conversation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    IntentResolution,
    Coherence,
    Relevance,
    Groundedness,
    ToolCallAccuracy,
    TaskAdherence,
    Fluency,
}

struct MetricInfo {
    key: MetricKey,
    name: &'static str,
    camel: &'static str,
    label: &'static str,
    tile: &'static str,
}

const METRICS: [MetricInfo; 7] = [
    MetricInfo {
        key: MetricKey::IntentResolution,
        name: "intent_resolution",
        camel: "intentResolution",
        label: "Intent Resolution",
        tile: "Intent",
    },
    MetricInfo {
        key: MetricKey::Coherence,
        name: "coherence",
        camel: "coherence",
        label: "Coherence",
        tile: "Coherence",
    },
    MetricInfo {
        key: MetricKey::Relevance,
        name: "relevance",
        camel: "relevance",
        label: "Relevance",
        tile: "Relevance",
    },
    MetricInfo {
        key: MetricKey::Groundedness,
        name: "groundedness",
        camel: "groundedness",
        label: "Groundedness",
        tile: "Grounded",
    },
    MetricInfo {
        key: MetricKey::ToolCallAccuracy,
        name: "tool_call_accuracy",
        camel: "toolCallAccuracy",
        label: "Tool Call Accuracy",
        tile: "Tool Acc",
    },
    MetricInfo {
        key: MetricKey::TaskAdherence,
        name: "task_adherence",
        camel: "taskAdherence",
        label: "Task Adherence",
        tile: "Task Adh",
    },
    MetricInfo {
        key: MetricKey::Fluency,
        name: "fluency",
        camel: "fluency",
        label: "Fluency",
        tile: "Fluency",
    },
];

impl MetricKey {
    pub const ALL: [MetricKey; 7] = [
        MetricKey::IntentResolution,
        MetricKey::Coherence,
        MetricKey::Relevance,
        MetricKey::Groundedness,
        MetricKey::ToolCallAccuracy,
        MetricKey::TaskAdherence,
        MetricKey::Fluency,
    ];

    fn info(self) -> &'static MetricInfo {
        // METRICS is declared in the same order as the enum variants.
        &METRICS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.info().name
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    /// Short caption used on summary tiles.
    pub fn tile_label(self) -> &'static str {
        self.info().tile
    }

    /// Prefix of the score metadata columns, e.g. `coherence.coherence`.
    pub fn raw_key_prefix(self) -> String {
        format!("{0}.{0}", self.as_str())
    }

    pub fn raw_key(self, field: &str) -> String {
        format!("{}.{field}", self.raw_key_prefix())
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = CoreError;

    /// Accepts both the snake_case key and the camelCase alias used by the
    /// dashboard front end.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        METRICS
            .iter()
            .find(|info| info.name == trimmed || info.camel == trimmed)
            .map(|info| info.key)
            .ok_or_else(|| CoreError::UnknownMetric(value.to_string()))
    }
}
