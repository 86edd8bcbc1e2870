use colview_columnar::ColumnarError;

pub type EvalResult<T> = Result<T, EvalError>;

/// Error type returned by user functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("duplicate function name: {0}")]
    DuplicateFunctionName(String),

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

    #[error("virtual column dependency cycle: {}", .path.join(" -> "))]
    CyclicColumnDefinition { path: Vec<String> },

    #[error("function {function} returned {actual} values for column {column}, expected {expected}")]
    ArityMismatch {
        column: String,
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("virtual column {column} nests deeper than the limit of {limit}")]
    DefinitionTooDeep { column: String, limit: usize },

    #[error("function {function} failed while computing {column}: {source}")]
    Function {
        function: String,
        column: String,
        #[source]
        source: BoxError,
    },
}

impl From<ColumnarError> for EvalError {
    fn from(err: ColumnarError) -> Self {
        match err {
            ColumnarError::UnknownColumn(name) => EvalError::UnknownColumn(name),
            ColumnarError::DuplicateColumn(name) => EvalError::DuplicateColumn(name),
            ColumnarError::TypeMismatch {
                context,
                expected,
                actual,
            } => EvalError::TypeMismatch {
                context,
                expected,
                actual,
            },
            ColumnarError::LengthMismatch {
                context,
                expected,
                actual,
            } => EvalError::LengthMismatch {
                context,
                expected,
                actual,
            },
        }
    }
}
