//! Error types for all schema catalog operations.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::types::Name;

/// Top-level error type for catalog mutations.
///
/// Lookups never produce an error: an unknown name or id is `None`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("index '{index}' references unknown space id {space_id}")]
    UnknownSpace { space_id: u32, index: Name },

    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}

/// A malformed, truncated or type-mismatched metadata tuple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema decode error at offset {offset}: {reason}")]
pub struct DecodeError {
    /// Byte offset into the batch where decoding stopped.
    pub offset: usize,
    pub reason: String,
}

impl DecodeError {
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
