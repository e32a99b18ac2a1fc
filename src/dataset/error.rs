#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Row {row}: missing value in column '{column}'")]
    MissingValue { row: usize, column: &'static str },
    #[error("Row {row}: invalid value '{value}' in column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
        reason: String,
    },
}
