//! This library implements Xor Filters -- immutable data structures for fast approximation of set
//! membership using little memory. Probabilistic filters like xor filters are useful for quickly
//! estimating the existence of an entity to avoid using an expensive resource.
//!
//! Xor filters are smaller than Bloom filters and answer queries with exactly three memory
//! accesses. They incur a relative time penalty in construction, and must be built from the full
//! element set at once; the expectation is that construction is amortized over many queries.
//!
//! A filter is built from any elements a [`HashProvider`] can hash (by default, anything
//! implementing [`Hash`], through [XXH3]). Only fingerprints are stored: elements cannot be listed,
//! removed or added after construction. Filters guarantee no false negatives, are safe to share
//! between threads, and serialize to a compact byte-exact format.
//!
//! ```
//! use xorfilter::{Filter, Strategy, XorFilter};
//!
//! let fruits = vec!["apple", "banana", "tangerine", "watermelon"];
//! let filter = XorFilter::build(&fruits, Strategy::Xor8, None).unwrap();
//!
//! assert!(filter.contains(&"tangerine"));
//! ```
//!
//! Filters are implemented as described in the paper
//! [Xor Filters: Faster and Smaller Than Bloom and Cuckoo Filters]. Construction peels a random
//! 3-uniform hypergraph over the slot array, retrying with a fresh seed until the peel succeeds.
//!
//! [`Hash`]: core::hash::Hash
//! [XXH3]: https://github.com/Cyan4973/xxHash
//! [Xor Filters: Faster and Smaller Than Bloom and Cuckoo Filters]: https://arxiv.org/abs/1912.08258

// Configuration attributes
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::nursery)]
#![allow(clippy::len_without_is_empty)]

mod error;
mod filter;
mod fingerprint;
mod hash;
mod index;
mod mapping;
mod murmur3;
mod splitmix64;
mod strategy;

pub use error::{Error, Result};
pub use filter::XorFilter;
pub use hash::{HashProvider, SeededHasher, Xxh3Provider};
pub use strategy::Strategy;

/// Methods common to filters.
pub trait Filter<Type: ?Sized> {
    /// Returns `true` if the filter probably contains the specified element.
    ///
    /// There can never be a false negative, but there is a small possibility of false positives.
    /// Refer to [`Strategy`] for false positive rates.
    fn contains(&self, element: &Type) -> bool;

    /// Returns the number of fingerprints in the filter.
    fn len(&self) -> usize;
}
