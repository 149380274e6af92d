//! [`MurmurHash3`]'s 64-bit finalization mix, causing bits to [avalanche].
//!
//! The filter uses it to derive a second, independent-looking 64-bit value from an element hash
//! without asking the hash provider for another seed.
//!
//! [`MurmurHash3`]: https://github.com/spaolacci/murmur3
//! [avalanche]: https://en.wikipedia.org/wiki/Avalanche_effect
//!
//! Copyright 2013, Sébastien Paolacci.
//! All rights reserved.
//!
//! Redistribution and use in source and binary forms, with or without
//! modification, are permitted provided that the following conditions are met:
//!     * Redistributions of source code must retain the above copyright
//!       notice, this list of conditions and the following disclaimer.
//!     * Redistributions in binary form must reproduce the above copyright
//!       notice, this list of conditions and the following disclaimer in the
//!       documentation and/or other materials provided with the distribution.
//!     * Neither the name of the library nor the
//!       names of its contributors may be used to endorse or promote products
//!       derived from this software without specific prior written permission.
//!
//! THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND
//! ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE IMPLIED
//! WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
//! DISCLAIMED. IN NO EVENT SHALL <COPYRIGHT HOLDER> BE LIABLE FOR ANY
//! DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES
//! (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES;
//! LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND
//! ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
//! (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
//! SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

const C1: u64 = 0xff51_afd7_ed55_8ccd;
const C2: u64 = 0xc4ce_b9fe_1a85_ec53;

/// Avalanches `seed + x`. All arithmetic wraps.
#[inline]
pub const fn finalize(seed: u64, x: u64) -> u64 {
    let mut h = seed.wrapping_add(x);
    h = (h ^ (h >> 33)).wrapping_mul(C1);
    h = (h ^ (h >> 33)).wrapping_mul(C2);
    h ^ (h >> 33)
}

#[cfg(test)]
mod test {
    use super::finalize;
    use rand::Rng;

    #[test]
    fn test_zero_is_a_fixed_point() {
        assert_eq!(finalize(0, 0), 0);
    }

    #[test]
    fn test_seed_is_added_to_input() {
        let mut rng = rand::thread_rng();
        for _ in 0..1_000 {
            let (seed, x): (u64, u64) = (rng.gen(), rng.gen());
            assert_eq!(finalize(seed, x), finalize(0, seed.wrapping_add(x)));
        }
    }

    #[test]
    fn test_single_bit_flips_avalanche() {
        const SAMPLE_SIZE: usize = 1_000;
        let mut rng = rand::thread_rng();

        let mut flipped: u64 = 0;
        for _ in 0..SAMPLE_SIZE {
            let x: u64 = rng.gen();
            let base = finalize(0, x);
            for bit in 0..64 {
                flipped += u64::from((base ^ finalize(0, x ^ (1 << bit))).count_ones());
            }
        }

        let mean = flipped as f64 / (SAMPLE_SIZE * 64) as f64;
        assert!((28.0..36.0).contains(&mean), "Mean flipped bits is {}", mean);
    }
}
