use thiserror::Error;

/// Contract violations by callers of the core. Dirty input data never ends
/// up here; it degrades to sentinel text instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unrecognized metric key: {0:?}")]
    UnknownMetric(String),

    #[error("no records match scope {0:?}")]
    EmptyScope(String),
}
