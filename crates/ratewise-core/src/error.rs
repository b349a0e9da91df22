//! Error types shared across ratewise.
//!
//! `ApiError` lives here rather than in `ratewise-client` so the loader and
//! service can decide between degrading and surfacing a failure without
//! matching on strings.

use thiserror::Error;

/// The item ratios of an evaluation set do not sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("ratios must sum to 100% (current: {actual}%)")]
pub struct RatioError {
    /// The observed ratio sum.
    pub actual: f64,
}

impl RatioError {
    /// Points missing to reach 100. Negative when the sum overshoots.
    pub fn deficit(&self) -> f64 {
        100.0 - self.actual
    }
}

/// A raw score/bonus input that the form refuses to accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Anything other than an unsigned digit string.
    #[error("not a whole number: {0:?}")]
    NotInteger(String),

    /// A whole number outside the allowed range.
    #[error("{value} is outside {min}..={max}")]
    OutOfRange { value: u64, min: u32, max: u32 },

    /// The form has no item with this id.
    #[error("unknown evaluation item: {0}")]
    UnknownItem(String),
}

/// Errors returned by the remote evaluation API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend could not be reached.
    #[error("cannot reach the evaluation server: {0}")]
    Network(String),

    /// The request did not complete within the client timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The backend answered with a non-2xx status.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Schema(String),
}

impl ApiError {
    /// Returns `true` for failures that a read may absorb by falling back to
    /// cached or default data.
    pub fn is_read_fallback(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout(_) | ApiError::Server { .. }
        )
    }
}

/// Errors from the local key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value for `{key}` is malformed: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a save was refused or failed.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Nothing was sent and the form is unchanged.
    #[error(transparent)]
    Ratio(#[from] RatioError),

    /// The form keeps its previous state.
    #[error("save failed: {0}")]
    Api(#[from] ApiError),

    /// The backend accepted the ratings; only the local copy is missing.
    #[error("saved remotely but the local copy could not be written: {0}")]
    Store(#[from] StoreError),
}

/// Why a feedback or interview submission was refused or failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Missing required input; nothing was sent.
    #[error("{0}")]
    Invalid(String),

    #[error("submission failed: {0}")]
    Api(#[from] ApiError),
}

/// Errors when loading a member's evaluation.
#[derive(Debug, Error)]
pub enum LoadError {
    /// There is no rating template to build the form from.
    #[error("no evaluation items are configured for this project")]
    MissingTemplate,
}
