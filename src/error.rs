use core::fmt;

/// Result alias for `schism`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the signed-network clustering pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Matrix is not square.
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Dimension mismatch between two related inputs.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Brute-force evaluation was requested for more clusters than it can
    /// afford (factorial cost).
    TooManyClusters {
        /// Requested cluster count.
        requested: usize,
        /// Maximum supported by the caller's evaluation budget.
        max: usize,
    },

    /// A matrix-completion routine failed. The offending algorithm and the
    /// underlying reason are always attached.
    CompletionFailed {
        /// Name of the completion algorithm ("svp", "sgd", or "als").
        algorithm: &'static str,
        /// Underlying failure description.
        reason: String,
    },

    /// Cholesky factorization failed, so the signed Laplacian is not
    /// positive semidefinite.
    NotPositiveSemidefinite,

    /// Iterative computation did not converge within the iteration limit.
    ConvergenceFailure {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::NotSquare { rows, cols } => {
                write!(f, "matrix is not square: {rows} rows, {cols} cols")
            }
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::TooManyClusters { requested, max } => {
                write!(
                    f,
                    "cluster evaluation supports at most {max} clusters, got {requested}"
                )
            }
            Error::CompletionFailed { algorithm, reason } => {
                write!(f, "check input for {algorithm}: {reason}")
            }
            Error::NotPositiveSemidefinite => {
                write!(f, "Cholesky failed, so signed Laplacian is not PSD")
            }
            Error::ConvergenceFailure { iterations } => {
                write!(f, "did not converge after {iterations} iterations")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
