/// Error types shared across the inspection report crates.
///
/// Only failures that cannot be recovered at a record boundary end up here. Malformed
/// attribute values and non-fatal markup problems are recorded as diagnostics instead
/// and never surface as a `CommonError`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("fatal markup error at byte {position}: {message}")]
    Fatal { position: u64, message: String },

    #[error("rule status REMOVED is no longer supported")]
    RemovedRuleStatus,

    #[error("schema validation failed: {0}")]
    Validation(String),

    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },
}
