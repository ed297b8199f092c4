use thiserror::Error;

/// Top-level error type for the curve plotting engine.
///
/// Rendering itself never fails; errors only arise while configuring the
/// engine.
#[derive(Debug, Error)]
pub enum CurvePlotError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to engine configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("vertex buffer capacity {capacity} is below the minimum of {min} points")]
    CapacityTooSmall { capacity: usize, min: usize },

    #[error("subdivision factor {0} must be at least 2")]
    InvalidSubdivisionFactor(u32),

    #[error("maximum subdivision depth must be positive")]
    ZeroMaxDepth,

    #[error("subdivision segment budget must be positive")]
    ZeroSegmentBudget,
}

/// Convenience type alias for results using [`CurvePlotError`].
pub type Result<T> = std::result::Result<T, CurvePlotError>;
