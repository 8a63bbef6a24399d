pub mod conversation;
pub mod drilldown;
pub mod status;
pub mod summary;

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::util::{write_json_pretty, write_json_stdout};

/// Writes a JSON report to `output` when given, otherwise to stdout.
fn emit_json<T: Serialize>(report: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_json_pretty(path, report)?;
            info!(path = %path.display(), "wrote report");
            Ok(())
        }
        None => write_json_stdout(report),
    }
}
