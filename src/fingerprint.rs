//! Fixed-width fingerprint storage.

use crate::{
    error::{Error, Result},
    index,
    mapping::KeyIndex,
};
use core::{convert::TryFrom, fmt::Debug};
use num_traits::{PrimInt, Unsigned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An unsigned integer type usable as a slot fingerprint.
pub trait Fingerprint: PrimInt + Unsigned + Debug {
    /// Bytes per fingerprint on the wire.
    const BYTES: usize;

    /// The top `8 * BYTES` bits of `hash`.
    fn from_hash(hash: u64) -> Self;

    /// Appends the big-endian encoding of `self`.
    fn put_be(self, out: &mut Vec<u8>);

    /// Decodes a big-endian fingerprint from exactly `BYTES` bytes.
    fn get_be(bytes: &[u8]) -> Self;
}

impl Fingerprint for u8 {
    const BYTES: usize = 1;

    #[inline]
    fn from_hash(hash: u64) -> Self {
        (hash >> 56) as u8
    }

    fn put_be(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    fn get_be(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl Fingerprint for u16 {
    const BYTES: usize = 2;

    #[inline]
    fn from_hash(hash: u64) -> Self {
        (hash >> 48) as u16
    }

    fn put_be(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }

    fn get_be(bytes: &[u8]) -> Self {
        u16::from_be_bytes([bytes[0], bytes[1]])
    }
}

/// A slot array of `3 * block_length` fingerprints.
///
/// After assignment, every key hash `x` the array was built from satisfies
/// `array[h0(x)] ^ array[h1(x)] ^ array[h2(x)] == fingerprint(x)`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "Vec<F>",
        into = "Vec<F>",
        bound(
            serialize = "F: Fingerprint + Serialize",
            deserialize = "F: Fingerprint + Deserialize<'de>"
        )
    )
)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FingerprintArray<F> {
    block_length: usize,
    fingerprints: Box<[F]>,
}

impl<F: Fingerprint> FingerprintArray<F> {
    fn zeroed(capacity: usize) -> Self {
        Self {
            block_length: capacity / 3,
            fingerprints: vec![F::zero(); capacity].into_boxed_slice(),
        }
    }

    /// Assigns fingerprints by consuming the peel `stack` from the top (see Algorithm 4 in the
    /// paper).
    ///
    /// A key's other two slots were peeled after it, so they are already final when its own slot
    /// is written.
    pub fn assign(capacity: usize, stack: &[KeyIndex]) -> Self {
        let mut array = Self::zeroed(capacity);
        for ki in stack.iter().rev() {
            array.put(ki.index, ki.hash);
        }
        array
    }

    fn put(&mut self, index: usize, hash: u64) {
        let [h0, h1, h2] = index::slots(hash, self.block_length);
        let fp = &mut self.fingerprints;
        fp[index] = F::zero();
        fp[index] = F::from_hash(hash) ^ fp[h0] ^ fp[h1] ^ fp[h2];
    }

    /// Returns `true` if the fingerprint of `hash` matches the xor of its three slots.
    #[inline]
    pub fn contains(&self, hash: u64) -> bool {
        let [h0, h1, h2] = index::slots(hash, self.block_length);
        let fp = &self.fingerprints;
        F::from_hash(hash) == fp[h0] ^ fp[h1] ^ fp[h2]
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub const fn block_length(&self) -> usize {
        self.block_length
    }

    #[cfg(test)]
    pub fn fingerprints(&self) -> &[F] {
        &self.fingerprints
    }

    /// Appends every slot, in slot order, big-endian.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.len() * F::BYTES);
        for fp in self.fingerprints.iter() {
            fp.put_be(out);
        }
    }

    /// Decodes `bytes.len() / F::BYTES` slots.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % F::BYTES != 0 {
            return Err(Error::format(format!(
                "{} bytes do not divide into {}-byte fingerprints",
                bytes.len(),
                F::BYTES
            )));
        }
        let fingerprints: Vec<F> = bytes.chunks_exact(F::BYTES).map(F::get_be).collect();
        Self::try_from(fingerprints)
    }
}

impl<F: Fingerprint> TryFrom<Vec<F>> for FingerprintArray<F> {
    type Error = Error;

    fn try_from(fingerprints: Vec<F>) -> Result<Self> {
        if fingerprints.is_empty() || fingerprints.len() % 3 != 0 {
            return Err(Error::format(format!(
                "slot count {} is not a positive multiple of 3",
                fingerprints.len()
            )));
        }

        Ok(Self {
            block_length: fingerprints.len() / 3,
            fingerprints: fingerprints.into_boxed_slice(),
        })
    }
}

impl<F> From<FingerprintArray<F>> for Vec<F> {
    fn from(array: FingerprintArray<F>) -> Self {
        array.fingerprints.into_vec()
    }
}
