//! Maps an element hash to its three slots, one per block.

use crate::murmur3;

/// [A fast alternative to the modulo reduction](http://lemire.me/blog/2016/06/27/a-fast-alternative-to-the-modulo-reduction/)
#[inline]
const fn reduce(hash: u32, n: usize) -> usize {
    ((hash as u64 * n as u64) >> 32) as usize
}

/// Computes the slots `[h0, h1, h2]` of `hash` in a slot array of `3 * block_length`.
///
/// `h0` is taken from the low half of the hash itself; `h1` and `h2` come from the two halves of
/// its finalized mix, so the three choices are independent over the construction seed.
#[inline]
pub const fn slots(hash: u64, block_length: usize) -> [usize; 3] {
    let mixed = murmur3::finalize(0, hash);

    [
        reduce(hash as u32, block_length),
        reduce(mixed as u32, block_length) + block_length,
        reduce((mixed >> 32) as u32, block_length) + 2 * block_length,
    ]
}

#[cfg(test)]
mod test {
    use super::{reduce, slots};
    use rand::Rng;

    #[test]
    fn test_reduce_bounds() {
        assert_eq!(reduce(0, 11), 0);
        assert_eq!(reduce(u32::MAX, 11), 10);
        assert_eq!(reduce(1 << 31, 10), 5);
    }

    #[test]
    fn test_each_slot_lands_in_its_block() {
        let mut rng = rand::thread_rng();
        for block_length in [1, 11, 4111, 1 << 20] {
            for _ in 0..10_000 {
                let [h0, h1, h2] = slots(rng.gen(), block_length);
                assert!(h0 < block_length);
                assert!((block_length..2 * block_length).contains(&h1));
                assert!((2 * block_length..3 * block_length).contains(&h2));
            }
        }
    }

    #[test]
    fn test_slots_are_deterministic() {
        let mut rng = rand::thread_rng();
        for _ in 0..1_000 {
            let hash: u64 = rng.gen();
            assert_eq!(slots(hash, 4111), slots(hash, 4111));
        }
    }

    #[test]
    fn test_slots_cover_every_block_position() {
        const BLOCK_LENGTH: usize = 64;
        let mut rng = rand::thread_rng();
        let mut seen = [false; 3 * BLOCK_LENGTH];

        for _ in 0..100_000 {
            for slot in slots(rng.gen(), BLOCK_LENGTH) {
                seen[slot] = true;
            }
        }

        assert!(seen.iter().all(|s| *s));
    }
}
