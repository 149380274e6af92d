//! The xor filter facade: construction, queries and the byte-exact wire format.

use crate::{
    error::{Error, Result},
    fingerprint::FingerprintArray,
    hash::{HashProvider, Xxh3Provider},
    mapping::{self, KeyIndex},
    splitmix64::SeedSource,
    strategy::Strategy,
    Filter,
};
use core::{
    borrow::Borrow,
    convert::TryFrom,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};
use std::io::{self, Read, Write};
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Strategy id, seed and capacity.
const HEADER_LEN: usize = 1 + 4 + 4;

/// Slot storage, tagged by fingerprint width.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slots {
    Xor8(FingerprintArray<u8>),
    Xor16(FingerprintArray<u16>),
}

impl Slots {
    fn assign(strategy: Strategy, capacity: usize, stack: &[KeyIndex]) -> Self {
        match strategy {
            Strategy::Xor8 => Self::Xor8(FingerprintArray::assign(capacity, stack)),
            Strategy::Xor16 => Self::Xor16(FingerprintArray::assign(capacity, stack)),
        }
    }

    fn decode(strategy: Strategy, bytes: &[u8]) -> Result<Self> {
        Ok(match strategy {
            Strategy::Xor8 => Self::Xor8(FingerprintArray::decode(bytes)?),
            Strategy::Xor16 => Self::Xor16(FingerprintArray::decode(bytes)?),
        })
    }

    #[inline]
    fn contains(&self, hash: u64) -> bool {
        match self {
            Self::Xor8(array) => array.contains(hash),
            Self::Xor16(array) => array.contains(hash),
        }
    }

    const fn strategy(&self) -> Strategy {
        match self {
            Self::Xor8(_) => Strategy::Xor8,
            Self::Xor16(_) => Strategy::Xor16,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Xor8(array) => array.len(),
            Self::Xor16(array) => array.len(),
        }
    }

    const fn block_length(&self) -> usize {
        match self {
            Self::Xor8(array) => array.block_length(),
            Self::Xor16(array) => array.block_length(),
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Xor8(array) => array.encode_into(out),
            Self::Xor16(array) => array.encode_into(out),
        }
    }
}

/// An immutable xor filter over elements of type `T`, hashed with the provider `H`.
///
/// The filter is built once from the complete element set and never changes afterwards; it holds
/// fingerprints only, not the elements. Queries never return a false negative, and return a false
/// positive with probability about `2^-8` ([`Strategy::Xor8`]) or `2^-16` ([`Strategy::Xor16`]).
///
/// ```
/// use xorfilter::{Strategy, XorFilter};
///
/// let elements: Vec<String> = (0..10_000).map(|i| i.to_string()).collect();
/// let filter = XorFilter::build(&elements, Strategy::Xor8, Some(1)).unwrap();
///
/// // no false negatives
/// for element in &elements {
///     assert!(filter.might_contain(element));
/// }
///
/// // few false positives
/// let false_positives = (10_000..20_000)
///     .map(|i| i.to_string())
///     .filter(|s| filter.might_contain(s))
///     .count();
/// assert!(false_positives < 100, "False positives: {}", false_positives);
/// ```
///
/// Filters serialize to a compact, byte-exact layout:
/// `[strategy id][seed: u32 BE][capacity: u32 BE][capacity fingerprints, BE]`.
///
/// ```
/// use xorfilter::{Strategy, XorFilter, Xxh3Provider};
///
/// let filter = XorFilter::build(&[1u64, 2, 3], Strategy::Xor16, Some(7)).unwrap();
/// let bytes = filter.to_bytes();
/// assert_eq!(bytes.len(), 9 + 2 * filter.capacity());
///
/// let restored: XorFilter<u64> = XorFilter::from_bytes(&bytes, Xxh3Provider).unwrap();
/// assert_eq!(restored, filter);
/// assert!(restored.might_contain(&2u64));
/// ```
///
/// Serializing and deserializing filters through serde can be enabled with the [`serde`]
/// feature. The hash provider is not serialized; it is restored with `Default`.
///
/// [`serde`]: http://serde.rs
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(serialize = "", deserialize = "H: Default"))
)]
pub struct XorFilter<T: ?Sized, H = Xxh3Provider> {
    seed: u32,
    slots: Slots,
    #[cfg_attr(feature = "serde", serde(skip))]
    hasher: H,
    #[cfg_attr(feature = "serde", serde(skip))]
    _type: PhantomData<fn(&T) -> bool>,
}

impl<T: Hash> XorFilter<T, Xxh3Provider> {
    /// Builds a filter from `elements` with the default hash provider.
    ///
    /// `seed` fixes the sequence of construction seeds; building the same elements with the same
    /// seed always yields the same filter. With `None`, a random seed is used. Duplicate elements
    /// are allowed and ignored.
    ///
    /// Fails with [`Error::InvalidArgument`] if there are too many elements to address.
    pub fn build(elements: &[T], strategy: Strategy, seed: Option<u64>) -> Result<Self> {
        Self::build_with_hasher(elements, strategy, seed, Xxh3Provider)
    }
}

impl<T: ?Sized, H: HashProvider<T>> XorFilter<T, H> {
    /// Builds a filter from `elements`, hashing them with `hasher`.
    pub fn build_with_hasher(
        elements: &[T],
        strategy: Strategy,
        seed: Option<u64>,
        hasher: H,
    ) -> Result<Self>
    where
        T: Sized,
    {
        Self::build_from_iter(elements, strategy, seed, hasher)
    }

    /// Builds a filter from an element iterator.
    ///
    /// Note: the iterator is cloned and walked once per construction attempt, so it should be
    /// cheap to clone and to iterate.
    pub fn build_from_iter<'a, I>(
        elements: I,
        strategy: Strategy,
        seed: Option<u64>,
        hasher: H,
    ) -> Result<Self>
    where
        T: 'a,
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: ExactSizeIterator + Clone,
    {
        let elements = elements.into_iter();
        let len = elements.len();
        mapping::ensure_addressable(len)?;

        let mut seeds = SeedSource::from_option(seed);
        let mapping = mapping::map(&mut seeds, len, |seed, hashes| {
            hashes.extend(elements.clone().map(|e| hasher.hash(seed, e)))
        });
        let slots = Slots::assign(strategy, mapping.capacity, &mapping.stack);

        debug!(
            %strategy,
            elements = len,
            distinct = mapping.distinct,
            capacity = mapping.capacity,
            attempts = mapping.attempts,
            seed = mapping.seed,
            "Built xor filter"
        );

        Ok(Self {
            seed: mapping.seed,
            slots,
            hasher,
            _type: PhantomData,
        })
    }

    /// Builds a filter from a fallible element stream.
    ///
    /// Elements are collected until the first error, which is returned unchanged; nothing is
    /// built and the rest of the stream is left unread.
    /// Construction errors are converted into `E`.
    pub fn try_build_from_iter<I, E>(
        elements: I,
        strategy: Strategy,
        seed: Option<u64>,
        hasher: H,
    ) -> core::result::Result<Self, E>
    where
        T: Sized,
        I: IntoIterator<Item = core::result::Result<T, E>>,
        E: From<Error>,
    {
        let elements = elements
            .into_iter()
            .collect::<core::result::Result<Vec<T>, E>>()?;
        Ok(Self::build_with_hasher(&elements, strategy, seed, hasher)?)
    }

    /// Returns `true` if the filter probably contains `element`.
    ///
    /// There can never be a false negative for an element the filter was built from.
    #[inline]
    pub fn might_contain<Q>(&self, element: &Q) -> bool
    where
        Q: ?Sized,
        T: Borrow<Q>,
        H: HashProvider<Q>,
    {
        let hash = HashProvider::<Q>::hash(&self.hasher, u64::from(self.seed), element);
        self.slots.contains(hash)
    }

    /// Reads a filter in the layout written by [`XorFilter::write_to`].
    ///
    /// `hasher` must be the provider the filter was built with. Fails with [`Error::Format`] on
    /// truncated input, an unknown strategy id or an impossible capacity.
    pub fn read_from<R: Read>(mut reader: R, hasher: H) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        read_exact(&mut reader, &mut header, "header")?;

        let strategy = Strategy::try_from(header[0])?;
        let seed = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
        let capacity = u32::from_be_bytes([header[5], header[6], header[7], header[8]]);
        trace!(%strategy, seed, capacity, "Read xor filter header");

        if capacity == 0 || capacity % 3 != 0 || capacity > i32::MAX as u32 {
            return Err(Error::format(format!("invalid capacity {}", capacity)));
        }

        // Read incrementally so a forged capacity cannot force a huge allocation up front.
        let expected = capacity as usize * strategy.slot_bytes();
        let mut body = Vec::new();
        reader.take(expected as u64).read_to_end(&mut body)?;
        if body.len() != expected {
            return Err(Error::format(format!(
                "truncated fingerprints: expected {} bytes, found {}",
                expected,
                body.len()
            )));
        }

        Ok(Self {
            seed,
            slots: Slots::decode(strategy, &body)?,
            hasher,
            _type: PhantomData,
        })
    }

    /// Decodes a filter from exactly the bytes produced by [`XorFilter::to_bytes`].
    pub fn from_bytes(bytes: &[u8], hasher: H) -> Result<Self> {
        let mut remaining = bytes;
        let filter = Self::read_from(&mut remaining, hasher)?;
        if !remaining.is_empty() {
            return Err(Error::format(format!(
                "{} trailing bytes after filter",
                remaining.len()
            )));
        }
        Ok(filter)
    }
}

impl<T: ?Sized, H> XorFilter<T, H> {
    /// The fingerprint width this filter was built with.
    pub const fn strategy(&self) -> Strategy {
        self.slots.strategy()
    }

    /// The construction seed the element hashes were derived under.
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Number of slots; always a multiple of 3.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots per block.
    pub const fn block_length(&self) -> usize {
        self.slots.block_length()
    }

    /// Bits of fingerprint storage per element, for a filter built from `num_elements` elements.
    pub fn bits_per_entry(&self, num_elements: usize) -> f64 {
        (self.capacity() as f64) * f64::from(self.strategy().bits()) / num_elements as f64
    }

    /// The hash provider queries go through.
    pub const fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Length of [`XorFilter::to_bytes`].
    pub fn serialized_len(&self) -> usize {
        HEADER_LEN + self.capacity() * self.strategy().slot_bytes()
    }

    /// Encodes the filter as `[strategy id][seed][capacity][fingerprints]`, all big-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        out.push(self.strategy().id());
        out.extend_from_slice(&self.seed.to_be_bytes());
        out.extend_from_slice(&(self.capacity() as u32).to_be_bytes());
        self.slots.encode_into(&mut out);
        out
    }

    /// Writes [`XorFilter::to_bytes`] to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::format(format!("truncated {}", what)),
        _ => Error::Io(e),
    })
}

impl<T: ?Sized, H: HashProvider<T>> Filter<T> for XorFilter<T, H> {
    /// Returns `true` if the filter probably contains `element`.
    fn contains(&self, element: &T) -> bool {
        let hash = HashProvider::<T>::hash(&self.hasher, u64::from(self.seed), element);
        self.slots.contains(hash)
    }

    fn len(&self) -> usize {
        self.capacity()
    }
}

impl<T: ?Sized, H> PartialEq for XorFilter<T, H> {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && self.slots == other.slots
    }
}

impl<T: ?Sized, H> Eq for XorFilter<T, H> {}

impl<T: ?Sized, H> Hash for XorFilter<T, H> {
    fn hash<S: Hasher>(&self, state: &mut S) {
        Hash::hash(&self.seed, state);
        Hash::hash(&self.slots, state);
    }
}

impl<T: ?Sized, H: Clone> Clone for XorFilter<T, H> {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            slots: self.slots.clone(),
            hasher: self.hasher.clone(),
            _type: PhantomData,
        }
    }
}

impl<T: ?Sized, H> fmt::Debug for XorFilter<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XorFilter")
            .field("strategy", &self.strategy())
            .field("seed", &self.seed)
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::HEADER_LEN;
    use crate::{Error, Filter, Strategy, XorFilter, Xxh3Provider};

    use rand::Rng;
    use std::collections::HashSet;

    fn random_keys(n: usize) -> Vec<u64> {
        let mut rng = rand::thread_rng();
        (0..n).map(|_| rng.gen()).collect()
    }

    #[test]
    fn test_initialization() {
        const SAMPLE_SIZE: usize = 1_000_000;
        let keys = random_keys(SAMPLE_SIZE);

        for strategy in Strategy::ALL {
            let filter = XorFilter::build(&keys, strategy, None).unwrap();
            for key in &keys {
                assert!(filter.contains(key));
            }
        }
    }

    #[test]
    fn test_bits_per_entry() {
        const SAMPLE_SIZE: usize = 1_000_000;
        let keys = random_keys(SAMPLE_SIZE);

        let filter = XorFilter::build(&keys, Strategy::Xor8, None).unwrap();
        let bpe = filter.bits_per_entry(SAMPLE_SIZE);
        assert!(bpe < 10., "Bits per entry is {}", bpe);

        let filter = XorFilter::build(&keys, Strategy::Xor16, None).unwrap();
        let bpe = filter.bits_per_entry(SAMPLE_SIZE);
        assert!(bpe < 20., "Bits per entry is {}", bpe);
    }

    #[test]
    fn test_false_positives() {
        const SAMPLE_SIZE: usize = 1_000_000;
        let keys = random_keys(SAMPLE_SIZE);
        let mut rng = rand::thread_rng();

        let filter = XorFilter::build(&keys, Strategy::Xor8, None).unwrap();
        let false_positives: usize = (0..SAMPLE_SIZE)
            .map(|_| rng.gen::<u64>())
            .filter(|n| filter.might_contain(n))
            .count();
        let fp_rate: f64 = (false_positives * 100) as f64 / SAMPLE_SIZE as f64;
        assert!(fp_rate < 0.45, "False positive rate is {}", fp_rate);

        let filter = XorFilter::build(&keys, Strategy::Xor16, None).unwrap();
        let false_positives: usize = (0..SAMPLE_SIZE)
            .map(|_| rng.gen::<u64>())
            .filter(|n| filter.might_contain(n))
            .count();
        let fp_rate: f64 = (false_positives * 100) as f64 / SAMPLE_SIZE as f64;
        assert!(fp_rate < 0.01, "False positive rate is {}", fp_rate);
    }

    #[test]
    fn test_capacity_is_fixed_by_element_count() {
        let filter = XorFilter::build(&random_keys(10_000), Strategy::Xor8, Some(1)).unwrap();
        assert_eq!(filter.capacity(), 12_333);
        assert_eq!(filter.block_length() * 3, filter.capacity());
        assert_eq!(filter.len(), filter.capacity());
    }

    #[test]
    fn test_unaddressable_element_count() {
        static ZERO: u64 = 0;
        let elements = (0..2_000_000_000usize).map(|_| &ZERO);

        let result = XorFilter::build_from_iter(elements, Strategy::Xor8, Some(1), Xxh3Provider);
        assert!(matches!(
            result,
            Err(Error::InvalidArgument { len: 2_000_000_000 })
        ));
    }

    #[test]
    fn test_header_layout() {
        let filter = XorFilter::build(&random_keys(100), Strategy::Xor16, Some(5)).unwrap();
        let bytes = filter.to_bytes();

        assert_eq!(bytes.len(), filter.serialized_len());
        assert_eq!(bytes.len(), HEADER_LEN + 2 * filter.capacity());
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1..5], filter.seed().to_be_bytes());
        assert_eq!(bytes[5..9], (filter.capacity() as u32).to_be_bytes());
    }

    #[test]
    fn test_write_to_matches_to_bytes() {
        let filter = XorFilter::build(&random_keys(100), Strategy::Xor8, Some(5)).unwrap();
        let mut out = Vec::new();
        filter.write_to(&mut out).unwrap();
        assert_eq!(out, filter.to_bytes());
    }

    #[test]
    fn test_truncated_input() {
        let filter = XorFilter::build(&random_keys(100), Strategy::Xor16, Some(5)).unwrap();
        let bytes = filter.to_bytes();

        for len in [0, 1, 5, HEADER_LEN - 1, HEADER_LEN, bytes.len() - 1] {
            let result = XorFilter::<u64>::from_bytes(&bytes[..len], Xxh3Provider);
            assert!(
                matches!(result, Err(Error::Format { .. })),
                "Accepted {} of {} bytes",
                len,
                bytes.len()
            );
        }
    }

    #[test]
    fn test_unknown_strategy_id() {
        let filter = XorFilter::build(&random_keys(100), Strategy::Xor8, Some(5)).unwrap();
        let mut bytes = filter.to_bytes();
        bytes[0] = 2;

        let result = XorFilter::<u64>::from_bytes(&bytes, Xxh3Provider);
        assert!(matches!(result, Err(Error::Format { .. })));
    }

    #[test]
    fn test_invalid_capacity() {
        for capacity in [0u32, 34, u32::MAX] {
            let mut bytes = vec![0u8];
            bytes.extend_from_slice(&1u32.to_be_bytes());
            bytes.extend_from_slice(&capacity.to_be_bytes());
            bytes.resize(bytes.len() + 64, 0);

            let result = XorFilter::<u64>::read_from(bytes.as_slice(), Xxh3Provider);
            assert!(matches!(result, Err(Error::Format { .. })));
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let filter = XorFilter::build(&random_keys(100), Strategy::Xor8, Some(5)).unwrap();
        let mut bytes = filter.to_bytes();
        bytes.push(0);

        let result = XorFilter::<u64>::from_bytes(&bytes, Xxh3Provider);
        assert!(matches!(result, Err(Error::Format { .. })));

        // A stream reader stops at the end of the filter.
        let mut reader = bytes.as_slice();
        assert!(XorFilter::<u64>::read_from(&mut reader, Xxh3Provider).is_ok());
        assert_eq!(reader, &[0u8][..]);
    }

    #[test]
    fn test_equal_filters_hash_equally() {
        let keys = random_keys(1_000);
        let filter = XorFilter::build(&keys, Strategy::Xor8, Some(3)).unwrap();
        let same = XorFilter::build(&keys, Strategy::Xor8, Some(3)).unwrap();
        let restored = XorFilter::<u64>::from_bytes(&filter.to_bytes(), Xxh3Provider).unwrap();
        let wider = XorFilter::build(&keys, Strategy::Xor16, Some(3)).unwrap();

        let mut set = HashSet::new();
        assert!(set.insert(filter));
        assert!(!set.insert(same));
        assert!(!set.insert(restored));
        assert!(set.insert(wider));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_fallible_stream_error_propagates() {
        #[derive(Debug)]
        enum StreamError {
            Broken,
            Filter(Error),
        }

        impl From<Error> for StreamError {
            fn from(e: Error) -> Self {
                Self::Filter(e)
            }
        }

        let mut elements = vec![Ok(1u64), Ok(2), Err(StreamError::Broken), Ok(4)].into_iter();
        let result =
            XorFilter::try_build_from_iter(&mut elements, Strategy::Xor8, None, Xxh3Provider);
        assert!(matches!(result, Err(StreamError::Broken)));
        // Collection stops at the error.
        assert!(matches!(elements.next(), Some(Ok(4))));

        let elements: Vec<Result<u64, StreamError>> = (0..1_000u64).map(Ok).collect();
        let filter =
            XorFilter::try_build_from_iter(elements, Strategy::Xor8, None, Xxh3Provider).unwrap();
        assert!((0..1_000u64).all(|i| filter.might_contain(&i)));
    }
}
