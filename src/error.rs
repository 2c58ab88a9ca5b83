use std::io;
use thiserror::Error;

/// Errors raised by the diagnostics library
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("invalid record {entity}: {reason}")]
    InvalidRecord { entity: String, reason: String },

    #[error("undefined {quantity} for {entity}: denominator is zero")]
    UndefinedRatio {
        entity: String,
        quantity: &'static str,
    },

    #[error("stored network snapshot is malformed: {0}")]
    MalformedSnapshot(String),

    #[error("network snapshot changed since it was loaded (expected version {expected}, found {found})")]
    WriteConflict { expected: i64, found: i64 },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, DiagnosticsError>;

impl DiagnosticsError {
    pub fn invalid<E: Into<String>, R: Into<String>>(entity: E, reason: R) -> Self {
        DiagnosticsError::InvalidRecord {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub fn undefined_ratio<E: Into<String>>(entity: E, quantity: &'static str) -> Self {
        DiagnosticsError::UndefinedRatio {
            entity: entity.into(),
            quantity,
        }
    }
}

/// Reject NaN, infinities and negative values for a quantity that must be a
/// physical amount.
pub(crate) fn check_non_negative(entity: &str, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(DiagnosticsError::invalid(
            entity,
            format!("{} is not a finite number ({})", field, value),
        ));
    }
    if value < 0.0 {
        return Err(DiagnosticsError::invalid(
            entity,
            format!("{} must not be negative (got {})", field, value),
        ));
    }
    Ok(())
}
