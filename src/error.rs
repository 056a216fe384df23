use thiserror::Error;

/// The top-level error type for this crate.
///
/// The engine passes themselves never fail — out-of-range and not-isolated
/// conditions are recorded as root status tags — so errors only arise when
/// constructing or validating a solve context.
#[derive(Debug, Error)]
pub enum Error {
    #[error("polynomial must have degree at least one")]
    DegreeTooSmall,

    #[error("leading coefficient must be non-zero")]
    ZeroLeadingCoefficient,

    #[error("expected {expected} coefficients, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("cluster registry is not a partition of the root indices")]
    InvalidRegistry,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
