//! Fingerprint width strategies and their wire identifiers.

use crate::error::Error;
use core::{convert::TryFrom, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Width of the fingerprints stored in each slot.
///
/// The discriminant is the strategy id written as the first byte of a serialized filter.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Strategy {
    /// 8-bit fingerprints, a false positive rate of about 0.39%.
    Xor8 = 0,
    /// 16-bit fingerprints, a false positive rate of about 0.0015%.
    Xor16 = 1,
}

impl Strategy {
    /// Every strategy, in id order.
    pub const ALL: [Self; 2] = [Self::Xor8, Self::Xor16];

    /// The strategy id used on the wire.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Bits per fingerprint.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Xor8 => 8,
            Self::Xor16 => 16,
        }
    }

    /// Bytes per serialized slot.
    pub const fn slot_bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// Expected false positive rate under an ideal hash, `2^-bits`.
    pub fn false_positive_rate(self) -> f64 {
        1.0 / (1u64 << self.bits()) as f64
    }
}

impl TryFrom<u8> for Strategy {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Self::Xor8),
            1 => Ok(Self::Xor16),
            _ => Err(Error::format(format!("unknown strategy id {}", id))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xor8 => f.write_str("xor8"),
            Self::Xor16 => f.write_str("xor16"),
        }
    }
}
