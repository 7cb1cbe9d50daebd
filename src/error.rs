//! Error types shared across the extraction pipeline.
//!
//! Local recovery is the rule everywhere else (quality rejections, coref
//! refusals and type-guard drops are data, not errors); only genuinely
//! fatal conditions surface through [`ExtractError`].

use thiserror::Error;

/// Errors that abort processing for a document.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Parser input failed validation (offsets out of bounds, invalid head
    /// index, non-monotonic sentence ranges).
    #[error("malformed parse input: {message}")]
    MalformedInput { message: String },

    /// A persisted graph was written by an incompatible schema version.
    #[error("schema version mismatch: found {found}, expected {expected}")]
    SchemaVersion { found: u32, expected: u32 },

    /// A relation names a predicate missing from the guard table.
    #[error("unknown predicate: {name}")]
    UnknownPredicate { name: String },

    /// The graph store could not read or write a document.
    #[error("store failure at {path}: {message}")]
    Store { path: String, message: String },

    /// Cooperative cancellation was requested; partial results discarded.
    #[error("processing cancelled at sentence {sentence_index}")]
    Cancelled { sentence_index: usize },
}

/// Result type for pipeline operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
