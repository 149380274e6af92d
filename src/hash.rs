//! Per-element hash providers.

use core::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};
use xxhash_rust::xxh3::Xxh3;

/// Maps a `(seed, element)` pair to a uniformly distributed 64-bit hash.
///
/// A provider must be deterministic: the same seed and element always hash to the same value. The
/// filter uses the one hash both for slot placement and for the fingerprint, so a filter can only
/// be queried (or deserialized) with the provider it was built with.
pub trait HashProvider<T: ?Sized> {
    /// Hashes `element` under `seed`.
    fn hash(&self, seed: u64, element: &T) -> u64;
}

impl<T: ?Sized, P: HashProvider<T> + ?Sized> HashProvider<T> for &P {
    #[inline]
    fn hash(&self, seed: u64, element: &T) -> u64 {
        (**self).hash(seed, element)
    }
}

/// The default provider: an [XXH3] digest of the element's [`Hash`] encoding, seeded with the
/// construction seed.
///
/// [XXH3]: https://github.com/Cyan4973/xxHash
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Xxh3Provider;

impl<T: Hash + ?Sized> HashProvider<T> for Xxh3Provider {
    #[inline]
    fn hash(&self, seed: u64, element: &T) -> u64 {
        let mut hasher = Xxh3::with_seed(seed);
        element.hash(&mut hasher);
        hasher.finish()
    }
}

/// Adapts any default-constructible [`Hasher`] into a provider by writing the seed ahead of the
/// element.
///
/// ```
/// use std::collections::hash_map::DefaultHasher;
/// use xorfilter::{Filter, SeededHasher, Strategy, XorFilter};
///
/// let fruits = ["apple", "banana", "tangerine", "watermelon"];
/// let filter = XorFilter::build_with_hasher(
///     &fruits,
///     Strategy::Xor16,
///     Some(7),
///     SeededHasher::<DefaultHasher>::default(),
/// )
/// .unwrap();
///
/// assert!(filter.contains(&"tangerine"));
/// ```
///
/// [`Hasher`]: core::hash::Hasher
pub struct SeededHasher<H> {
    _hasher: PhantomData<fn() -> H>,
}

impl<T, H> HashProvider<T> for SeededHasher<H>
where
    T: Hash + ?Sized,
    H: Hasher + Default,
{
    #[inline]
    fn hash(&self, seed: u64, element: &T) -> u64 {
        let mut hasher = H::default();
        hasher.write_u64(seed);
        element.hash(&mut hasher);
        hasher.finish()
    }
}

impl<H> Default for SeededHasher<H> {
    fn default() -> Self {
        Self {
            _hasher: PhantomData,
        }
    }
}

impl<H> Clone for SeededHasher<H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for SeededHasher<H> {}

impl<H> fmt::Debug for SeededHasher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededHasher")
            .field("hasher", &core::any::type_name::<H>())
            .finish()
    }
}
