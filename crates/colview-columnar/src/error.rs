use crate::types::ColumnType;

pub type ColumnarResult<T> = Result<T, ColumnarError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColumnarError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("type error in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("length mismatch for {context}: expected {expected} rows, got {actual}")]
    LengthMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },
}

impl ColumnarError {
    pub(crate) fn type_mismatch(
        context: impl Into<String>,
        expected: impl ToString,
        actual: ColumnType,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
