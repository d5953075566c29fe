//! Committee sampling.
//!
//! The committee is drawn with a partial Fisher–Yates shuffle driven by a
//! ChaCha20 stream keyed from the block anchor. Same anchor and same
//! candidates give the same committee on every machine.

use bundlr_types::{Address, Hash};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Domain tag mixed into the seed so the stream is not the raw anchor.
const SEED_DOMAIN: &[u8] = b"bundlr/committee/v1";

/// Select `min(k, candidates.len())` distinct addresses without replacement.
///
/// `candidates` must be in a canonical order (the Active set sorted by
/// address). When there are at most `k` candidates all of them are returned
/// without touching the RNG. The result is sorted.
pub fn sample_committee(anchor: &Hash, candidates: &[Address], k: usize) -> Vec<Address> {
    if candidates.len() <= k {
        return candidates.to_vec();
    }

    let seed = Hash::from_parts(&[SEED_DOMAIN, anchor.as_bytes()]);
    let mut rng = ChaCha20Rng::from_seed(seed.to_bytes());

    let n = candidates.len();
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        // Draw in u64 so the stream does not depend on the target's usize width.
        let j = rng.gen_range(i as u64..n as u64) as usize;
        indices.swap(i, j);
    }

    let mut nominated: Vec<Address> = indices[..k]
        .iter()
        .map(|&index| candidates[index].clone())
        .collect();
    nominated.sort();
    nominated
}
