use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Out-of-range access, incompatible broadcast/reshape/matmul shapes,
    /// feature-count mismatches, or too few output columns.
    #[error("shape error: {0}")]
    Shape(String),

    /// Operation invoked in a state that cannot support it (no layers,
    /// backward before forward).
    #[error("logic error: {0}")]
    Logic(String),

    /// Parameter vector length mismatch.
    #[error("length error: expected {expected} values, got {got}")]
    Length { expected: usize, got: usize },

    #[error("queue closed")]
    QueueClosed,

    #[error("task failed: {0}")]
    TaskFailed(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            Error::Io(err.to_string())
        } else {
            Error::InvalidData(err.to_string())
        }
    }
}

impl Error {
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Error::Shape(msg.into())
    }

    pub(crate) fn logic(msg: impl Into<String>) -> Self {
        Error::Logic(msg.into())
    }
}
