//! Error types for decoding and ingestion.
//!
//! Row-level problems (missing geometry, unparsable numbers or dates) are
//! never surfaced as errors: ingestion substitutes fallbacks and keeps going.
//! Only a malformed polyline string or a structurally broken CSV stream
//! produces an error value.

use thiserror::Error;

/// A polyline string violated the encoding's structural invariants.
///
/// Decoding fails atomically: no partially-accumulated coordinates are
/// visible to the caller when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The string ended while a chunk's continuation bit was still set.
    #[error("polyline truncated inside a chunk at byte {position}")]
    TruncatedChunk { position: usize },

    /// A byte below the printable offset (63) appeared in the string.
    #[error("invalid polyline character {byte:#04x} at byte {position}")]
    InvalidCharacter { position: usize, byte: u8 },

    /// A single delta ran past the capacity of a 64-bit accumulator; no
    /// real coordinate delta needs more than a handful of chunks.
    #[error("overlong polyline chunk at byte {position}")]
    ChunkTooLong { position: usize },

    /// A latitude delta was decoded but the string ended before its
    /// longitude counterpart.
    #[error("polyline ends with a latitude delta at byte {position} and no longitude")]
    MissingLongitude { position: usize },
}

/// A CSV stream could not be read at all.
///
/// Individual bad rows never produce this; they are skipped and counted in
/// the [`IngestReport`](crate::ingest::IngestReport).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read CSV input: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for ingestion.
pub type Result<T> = std::result::Result<T, IngestError>;
