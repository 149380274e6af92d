//! Builds the element/slot hypergraph and peels it into an assignment order (see Algorithm 3 in
//! the paper).

use crate::{
    error::{Error, Result},
    index,
    splitmix64::SeedSource,
};
use std::collections::VecDeque;
use tracing::debug;

const LOAD_FACTOR: f64 = 1.23;
const SLACK: f64 = 32.0;

/// Number of slots for `num_keys` distinct hashes, rounded up to a multiple of 3.
#[inline]
pub fn capacity(num_keys: usize) -> usize {
    let slots = (LOAD_FACTOR * num_keys as f64 + SLACK).ceil() as usize;
    (slots + 2) / 3 * 3
}

/// Fails if `len` elements would need more slots than a 32-bit signed index can address.
pub fn ensure_addressable(len: usize) -> Result<()> {
    if LOAD_FACTOR * len as f64 + SLACK > i32::MAX as f64 || capacity(len) > i32::MAX as usize {
        return Err(Error::InvalidArgument { len });
    }
    Ok(())
}

/// A peeled key hash and the slot it was peeled from.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct KeyIndex {
    pub hash: u64,
    pub index: usize,
}

/// A set in the construction array H. Elements are encoded via xor with the mask.
#[derive(Default, Copy, Clone)]
struct HSet {
    count: u32,
    mask: u64,
}

/// Scratch state for peeling, sized once and reset between attempts.
pub struct Mapper {
    block_length: usize,
    sets: Box<[HSet]>,
    queue: VecDeque<usize>,
    stack: Vec<KeyIndex>,
}

impl Mapper {
    pub fn new(capacity: usize, num_keys: usize) -> Self {
        Self {
            block_length: capacity / 3,
            sets: vec![HSet::default(); capacity].into_boxed_slice(),
            queue: VecDeque::with_capacity(capacity),
            stack: Vec::with_capacity(num_keys),
        }
    }

    fn reset(&mut self) {
        self.sets.fill(HSet::default());
        self.queue.clear();
        self.stack.clear();
    }

    /// Runs one peeling attempt over distinct `hashes`. Returns `true` if every key was peeled.
    pub fn peel(&mut self, hashes: &[u64]) -> bool {
        self.reset();

        // Populate H by adding each key to its three sets.
        for &hash in hashes {
            for slot in index::slots(hash, self.block_length) {
                let set = &mut self.sets[slot];
                set.mask ^= hash;
                set.count += 1;
            }
        }

        for (slot, set) in self.sets.iter().enumerate() {
            if set.count == 1 {
                self.queue.push_back(slot);
            }
        }

        while let Some(slot) = self.queue.pop_front() {
            // The count may have dropped since the slot was queued.
            if self.sets[slot].count != 1 {
                continue;
            }

            // If there is only one key, the mask contains it wholly.
            let hash = self.sets[slot].mask;
            self.stack.push(KeyIndex { hash, index: slot });

            for other in index::slots(hash, self.block_length) {
                let set = &mut self.sets[other];
                set.mask ^= hash;
                set.count -= 1;
                if set.count == 1 {
                    self.queue.push_back(other);
                }
            }
        }

        self.stack.len() == hashes.len()
    }

    pub fn peeled(&self) -> usize {
        self.stack.len()
    }

    pub fn into_stack(self) -> Vec<KeyIndex> {
        self.stack
    }
}

/// The outcome of a successful mapping.
pub struct Mapping {
    /// Construction seed that produced a full peel.
    pub seed: u32,
    pub capacity: usize,
    /// Distinct key hashes under `seed`.
    pub distinct: usize,
    pub attempts: usize,
    /// Peel order; assignment consumes it from the back.
    pub stack: Vec<KeyIndex>,
}

/// Draws seeds from `seeds` until the key hashes produced by `hash_all` peel completely.
///
/// `hash_all` must push the hash of every element under the given seed. The slot count is fixed
/// from the distinct hashes under the first seed and kept for every later attempt.
pub fn map<F>(seeds: &mut SeedSource, len: usize, mut hash_all: F) -> Mapping
where
    F: FnMut(u64, &mut Vec<u64>),
{
    let mut hashes = Vec::with_capacity(len);
    let mut seed = seeds.next_seed();
    hash_distinct(&mut hash_all, seed, &mut hashes);

    let capacity = capacity(hashes.len());
    if hashes.is_empty() {
        return Mapping {
            seed,
            capacity,
            distinct: 0,
            attempts: 1,
            stack: Vec::new(),
        };
    }

    let mut mapper = Mapper::new(capacity, hashes.len());
    let mut attempts = 1;
    while !mapper.peel(&hashes) {
        debug!(
            seed,
            attempt = attempts,
            peeled = mapper.peeled(),
            distinct = hashes.len(),
            "Peeling left a cyclic core, reseeding"
        );
        seed = seeds.next_seed();
        attempts += 1;
        hash_distinct(&mut hash_all, seed, &mut hashes);
    }

    Mapping {
        seed,
        capacity,
        distinct: hashes.len(),
        attempts,
        stack: mapper.into_stack(),
    }
}

fn hash_distinct<F>(hash_all: &mut F, seed: u32, hashes: &mut Vec<u64>)
where
    F: FnMut(u64, &mut Vec<u64>),
{
    hashes.clear();
    hash_all(u64::from(seed), hashes);
    hashes.sort_unstable();
    hashes.dedup();
}
