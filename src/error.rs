use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors produced by exposure computations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed timestamp, step count, numeric field or mesh buffer.
    #[error("invalid input: {0}")]
    InputParse(String),

    /// An entity lacks the mesh or transform data required for a computation.
    #[error("entity '{entity}' has no usable geometry")]
    MissingGeometry { entity: String },

    /// Unrecognized step unit, invalid sample counts and similar settings.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The requested time range ends before it starts.
    #[error("end {end} is before start {start}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// The run was cancelled at a suspension point.
    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
