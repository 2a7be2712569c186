//! Error type for table construction and fallible reservation.
//!
//! Lookups never fail: a missing element is `None`. Errors only come from
//! rejecting a configuration or from the explicit `reserve` path, where the
//! caller asked to learn about allocation failure instead of aborting.

use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Address widths must satisfy `min <= max <= 32`.
    #[error("bucket bits out of range: min {min}, max {max} (limit {limit})")]
    BitsOutOfRange { min: u32, max: u32, limit: u32 },

    /// A fixed table has a single width, which must not exceed the limit.
    #[error("bucket bits {bits} exceed the limit of {limit}")]
    TooManyBits { bits: u32, limit: u32 },

    #[error("invalid load factor {num}/{den}")]
    InvalidLoadFactor { num: u32, den: u32 },

    /// Shrinking right after a grow (or growing right after a shrink) would
    /// oscillate at the boundary.
    #[error("shrink load factor {shrink} must be below half of grow load factor {grow}")]
    NoHysteresis { grow: String, shrink: String },

    #[error("capacity overflow: {requested} elements exceed the maximum bucket count")]
    CapacityOverflow { requested: usize },

    #[error("bucket allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

pub type Result<T> = core::result::Result<T, TableError>;
