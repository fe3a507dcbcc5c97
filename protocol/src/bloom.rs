//! Probabilistic bloom filter used for governance vote sync.
//!
//! A peer requesting votes for an object sends a filter seeded with the
//! vote hashes it already has; the responder skips matching votes. False
//! positives only cost a re-request, never correctness.

use orin_types::Hash256;
use serde::{Deserialize, Serialize};

/// Hard cap on the filter bit-array size in bytes.
const MAX_BLOOM_FILTER_SIZE: usize = 36_000;
/// Hard cap on the number of hash functions.
const MAX_HASH_FUNCS: u32 = 50;

const LN2_SQUARED: f64 = 0.480_453_013_918_201_4;
const LN2: f64 = 0.693_147_180_559_945_3;

/// A murmur3-based bloom filter, sized from an expected element count and a
/// target false-positive rate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilter {
    data: Vec<u8>,
    hash_funcs: u32,
    tweak: u32,
}

impl BloomFilter {
    /// Build an empty filter sized for `elements` entries at `fp_rate`.
    pub fn new(elements: u32, fp_rate: f64, tweak: u32) -> Self {
        let elements = elements.max(1) as f64;
        let size = (-1.0 / LN2_SQUARED * elements * fp_rate.ln() / 8.0) as usize;
        let size = size.clamp(1, MAX_BLOOM_FILTER_SIZE);
        let hash_funcs = ((size * 8) as f64 / elements * LN2) as u32;
        Self {
            data: vec![0u8; size],
            hash_funcs: hash_funcs.clamp(1, MAX_HASH_FUNCS),
            tweak,
        }
    }

    /// An empty filter that matches nothing. This is what a peer sends when
    /// it has no votes yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: &Hash256) {
        if self.data.is_empty() {
            return;
        }
        let bits = self.data.len() * 8;
        for i in 0..self.hash_funcs {
            let idx = self.hash_at(i, hash.as_bytes()) as usize % bits;
            self.data[idx >> 3] |= 1 << (idx & 7);
        }
    }

    pub fn contains(&self, hash: &Hash256) -> bool {
        if self.data.is_empty() {
            return false;
        }
        let bits = self.data.len() * 8;
        (0..self.hash_funcs).all(|i| {
            let idx = self.hash_at(i, hash.as_bytes()) as usize % bits;
            self.data[idx >> 3] & (1 << (idx & 7)) != 0
        })
    }

    fn hash_at(&self, func: u32, data: &[u8]) -> u32 {
        murmur3(func.wrapping_mul(0xFBA4_C795).wrapping_add(self.tweak), data)
    }
}

/// MurmurHash3 (x86, 32-bit).
fn murmur3(seed: u32, data: &[u8]) -> u32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    let mut h1 = seed;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k1 = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k1 = k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h1 = (h1 ^ k1)
            .rotate_left(13)
            .wrapping_mul(5)
            .wrapping_add(0xe654_6b64);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k1 = 0u32;
        for (i, b) in tail.iter().enumerate() {
            k1 |= (*b as u32) << (8 * i);
        }
        k1 = k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= data.len() as u32;
    h1 ^= h1 >> 16;
    h1 = h1.wrapping_mul(0x85eb_ca6b);
    h1 ^= h1 >> 13;
    h1 = h1.wrapping_mul(0xc2b2_ae35);
    h1 ^ (h1 >> 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_hashes_match() {
        let mut filter = BloomFilter::new(100, 0.001, 42);
        for i in 0..100u64 {
            filter.insert(&Hash256::from_low_u64(i));
        }
        for i in 0..100u64 {
            assert!(filter.contains(&Hash256::from_low_u64(i)));
        }
    }

    #[test]
    fn absent_hashes_mostly_miss() {
        let mut filter = BloomFilter::new(100, 0.001, 7);
        for i in 0..100u64 {
            filter.insert(&Hash256::from_low_u64(i));
        }
        let false_positives = (1000..2000u64)
            .filter(|i| filter.contains(&Hash256::from_low_u64(*i)))
            .count();
        // 0.1% target rate; allow generous slack.
        assert!(false_positives < 20, "false positives: {false_positives}");
    }

    #[test]
    fn empty_filter_matches_nothing() {
        let filter = BloomFilter::empty();
        assert!(!filter.contains(&Hash256::from_low_u64(1)));
    }

    #[test]
    fn tweak_changes_bit_pattern() {
        let mut a = BloomFilter::new(10, 0.01, 1);
        let mut b = BloomFilter::new(10, 0.01, 2);
        a.insert(&Hash256::from_low_u64(9));
        b.insert(&Hash256::from_low_u64(9));
        assert_ne!(a, b);
    }
}
