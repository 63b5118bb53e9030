//! Benchmark input generators for the Keel foundation layer.
//!
//! All generators are seeded, so every benchmark run sees the same
//! inputs:
//!
//! - [`shuffled_values`]: a permutation of `0..len`, for sort and
//!   search workloads with no duplicates
//! - [`random_values`]: uniform random `u32`s, duplicates allowed
//! - [`clustered_values`]: values drawn from a small key range, for
//!   equal-range search workloads

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// A shuffled permutation of `0..len`.
///
/// Every value occurs exactly once, so search hits are unambiguous.
pub fn shuffled_values(len: u32, seed: u64) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut values: Vec<u32> = (0..len).collect();
    values.shuffle(&mut rng);
    values
}

/// `len` uniform random `u32`s. Duplicates allowed.
pub fn random_values(len: u32, seed: u64) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.random::<u32>()).collect()
}

/// `len` values drawn uniformly from `0..keys`.
///
/// With `keys` much smaller than `len`, every key occurs many times,
/// which exercises equal-range searches over long runs of duplicates.
pub fn clustered_values(len: u32, keys: u32, seed: u64) -> Vec<u32> {
    assert!(keys > 0, "clustered_values requires at least one key");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.random::<u32>() % keys).collect()
}
