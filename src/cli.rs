use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "evalboard",
    version,
    about = "Pass-rate summaries and drilldowns for agent conversation evaluations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Per-metric pass rates across the dataset.
    Summary(SummaryArgs),
    /// Per-conversation outcomes for one metric.
    Drilldown(DrilldownArgs),
    /// Extracted content and verdicts for one conversation.
    Conversation(ConversationArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    #[arg(long, default_value = "data/evaluations.json")]
    pub dataset: PathBuf,

    #[arg(long, default_value_t = false)]
    pub per_record: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DrilldownArgs {
    #[arg(long, default_value = "data/evaluations.json")]
    pub dataset: PathBuf,

    /// Metric key, snake_case or camelCase (e.g. `tool_call_accuracy`).
    #[arg(long)]
    pub metric: String,

    /// `all`, a conversation id, or a 1-based position such as `run_3`.
    #[arg(long, default_value = "all")]
    pub scope: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ConversationArgs {
    #[arg(long, default_value = "data/evaluations.json")]
    pub dataset: PathBuf,

    /// Conversation id, or a 1-based position such as `run_3`.
    #[arg(long)]
    pub conversation: String,

    /// Include the structured JSON views of the raw artifacts.
    #[arg(long, default_value_t = false)]
    pub views: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data/evaluations.json")]
    pub dataset: PathBuf,
}
