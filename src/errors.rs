use crate::field::FieldId;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum DsgeError {
    #[error("unknown key '{key}' in the {field} table")]
    UnknownKey { field: FieldId, key: String },
    #[error("index {index} out of bounds for {field} of length {len}")]
    IndexOutOfBounds {
        field: FieldId,
        index: usize,
        len: usize,
    },
    #[error("range {lo}..{hi} out of bounds for {field} of length {len}")]
    RangeOutOfBounds {
        field: FieldId,
        lo: usize,
        hi: usize,
        len: usize,
    },
    #[error("cell ({row}, {col}) out of bounds for {field}")]
    CellOutOfBounds {
        field: FieldId,
        row: usize,
        col: usize,
    },
    #[error("shock covariance must be square, got {rows}x{cols}")]
    NonSquareCovariance { rows: usize, cols: usize },
    #[error("stage {stage} failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },
}

/// Convenience type for `Result<T, DsgeError>`.
pub type DsgeResult<T> = Result<T, DsgeError>;
