//! Load-factor thresholds that drive resizing.

use crate::error::{Result, TableError};
use core::fmt;

/// Widest bucket address: hashes are 32 bits.
pub const MAX_BITS: u32 = 32;

/// Default minimum table size, `2^4 = 16` buckets.
pub const DEFAULT_MIN_BITS: u32 = 4;

/// A load factor expressed as the exact ratio `num / den`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadFactor {
    num: u32,
    den: u32,
}

impl LoadFactor {
    pub const HALF: LoadFactor = LoadFactor { num: 1, den: 2 };
    pub const EIGHTH: LoadFactor = LoadFactor { num: 1, den: 8 };

    pub fn new(num: u32, den: u32) -> Result<Self> {
        if num == 0 || den == 0 {
            return Err(TableError::InvalidLoadFactor { num, den });
        }
        Ok(Self { num, den })
    }

    /// `elements > buckets * self`, exact.
    #[inline]
    pub fn exceeded_by(self, elements: usize, buckets: usize) -> bool {
        elements as u128 * self.den as u128 > buckets as u128 * self.num as u128
    }

    /// `elements < buckets * self`, exact.
    #[inline]
    pub fn undercut_by(self, elements: usize, buckets: usize) -> bool {
        (elements as u128) * (self.den as u128) < (buckets as u128) * (self.num as u128)
    }

    /// Smallest bucket count `b` with `elements <= b * self`.
    pub(crate) fn buckets_for(self, elements: usize) -> u128 {
        let num = self.num as u128;
        (elements as u128 * self.den as u128).div_ceil(num)
    }
}

impl fmt::Display for LoadFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// When a resizable table grows and shrinks.
///
/// A table grows once its element count is above `bucket_count * grow` and
/// shrinks once it is below `bucket_count * shrink`. The address width never
/// leaves `min_bits..=max_bits`. `shrink` must be strictly below half of
/// `grow`, otherwise a doubling could immediately qualify for a halving.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResizePolicy {
    min_bits: u32,
    max_bits: u32,
    grow: LoadFactor,
    shrink: LoadFactor,
}

impl ResizePolicy {
    pub fn new(min_bits: u32, max_bits: u32, grow: LoadFactor, shrink: LoadFactor) -> Result<Self> {
        if min_bits > max_bits || max_bits > MAX_BITS {
            return Err(TableError::BitsOutOfRange {
                min: min_bits,
                max: max_bits,
                limit: MAX_BITS,
            });
        }
        // shrink < grow / 2
        if 2 * shrink.num as u128 * grow.den as u128 >= grow.num as u128 * shrink.den as u128 {
            return Err(TableError::NoHysteresis {
                grow: grow.to_string(),
                shrink: shrink.to_string(),
            });
        }
        Ok(Self {
            min_bits,
            max_bits,
            grow,
            shrink,
        })
    }

    /// Same thresholds with a different minimum width.
    pub fn with_min_bits(self, min_bits: u32) -> Result<Self> {
        Self::new(min_bits, self.max_bits, self.grow, self.shrink)
    }

    pub fn min_bits(&self) -> u32 {
        self.min_bits
    }
    pub fn max_bits(&self) -> u32 {
        self.max_bits
    }
    pub fn grow(&self) -> LoadFactor {
        self.grow
    }
    pub fn shrink(&self) -> LoadFactor {
        self.shrink
    }

    #[inline]
    pub(crate) fn should_grow(&self, elements: usize, buckets: usize) -> bool {
        self.grow.exceeded_by(elements, buckets)
    }

    #[inline]
    pub(crate) fn should_shrink(&self, elements: usize, buckets: usize) -> bool {
        self.shrink.undercut_by(elements, buckets)
    }

    /// Address width needed so that `elements` fit without triggering growth.
    /// `None` when that exceeds `max_bits`.
    pub(crate) fn bits_for(&self, elements: usize) -> Option<u32> {
        let need = self.grow.buckets_for(elements).max(1);
        let bits = need.next_power_of_two().trailing_zeros().max(self.min_bits);
        (bits <= self.max_bits).then_some(bits)
    }
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self {
            min_bits: DEFAULT_MIN_BITS,
            max_bits: MAX_BITS,
            grow: LoadFactor::HALF,
            shrink: LoadFactor::EIGHTH,
        }
    }
}

/// Mask selecting the low `bits` bits of a hash.
#[inline]
pub(crate) fn mask(bits: u32) -> u32 {
    debug_assert!(bits <= MAX_BITS);
    u32::MAX.checked_shr(MAX_BITS - bits).unwrap_or(0)
}
