use crate::foundation::core::DocId;

/// Convenience result type used across imagebench.
pub type BenchResult<T> = Result<T, BenchError>;

/// Error taxonomy for the fallible edges of the engine (codec, history, config, bake reservation).
///
/// Geometry, placement and sequencing never produce these: they clamp or no-op instead.
#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    /// Invalid user-provided data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image source could not be decoded into pixels.
    #[error("decode error: {0}")]
    Decode(String),

    /// Pixels could not be encoded into the requested format.
    #[error("encode error: {0}")]
    Encode(String),

    /// The persistent history store rejected a read or write.
    #[error("history error: {0}")]
    History(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// A bake for this document is already running.
    #[error("bake already in progress for document {0}")]
    BakeInProgress(DocId),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BenchError {
    /// Build a [`BenchError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BenchError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`BenchError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`BenchError::History`] value.
    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    /// Build a [`BenchError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
