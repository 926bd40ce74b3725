/// Failures surfaced by the loader and the analytics components.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// The backing CSV file does not exist.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// An aggregation was asked for over zero rows.
    #[error("no data: {0}")]
    EmptyDataset(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("division by zero: {0}")]
    DivideByZero(String),

    /// A row failed typed validation while loading.
    #[error("malformed row in {file} at line {line}: {reason}")]
    Malformed {
        file: String,
        line: u64,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalyticsError {
    /// Stable machine-readable tag used in CLI error output.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::DataUnavailable(_) => "data_unavailable",
            AnalyticsError::EmptyDataset(_) => "empty_dataset",
            AnalyticsError::NotFound(_) => "not_found",
            AnalyticsError::InvalidArgument(_) => "invalid_argument",
            AnalyticsError::DivideByZero(_) => "divide_by_zero",
            AnalyticsError::Malformed { .. } => "malformed_data",
            AnalyticsError::Csv(_) | AnalyticsError::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
