//! Minimizer selection
//!
//! The minimizer of a k-mer is its minimum-hash m-mer. Selection slides an
//! m-wide window over the no-reverse packed k-mer: the window at position 0
//! is the low `2m` bits, and each step is a right shift by 2.

use crate::constants;
use crate::encoding;
use crate::hasher;
use crate::kmer::KmerWord;

/// Compute the minimizer of a k-mer together with its position.
///
/// Returns `(minimizer, pos)` where `pos` is the window index in
/// `0..=(k - m)`. Ties on the hash go to the earliest window (strict `<`).
pub fn compute_minimizer_pos(mut kmer: KmerWord, k: u64, m: u64, seed: u64) -> (u64, u64) {
    debug_assert!(m <= constants::MAX_M);
    debug_assert!(m <= k);
    let mask: KmerWord = (1u128 << (2 * m)) - 1;
    let mut min_hash = u64::MAX;
    let mut minimizer = 0u64;
    let mut pos = 0u64;
    for i in 0..=(k - m) {
        let sub_kmer = (kmer & mask) as u64;
        let hash = hasher::hash_u64(sub_kmer, seed);
        if hash < min_hash {
            min_hash = hash;
            minimizer = sub_kmer;
            pos = i;
        }
        kmer >>= 2;
    }
    (minimizer, pos)
}

/// Canonical minimizer selection.
///
/// Computes the minimizer of both the k-mer and its reverse complement and
/// keeps the side whose m-mer code is numerically smaller (not the smaller
/// hash). When the reverse-complement side wins, the position is reflected
/// back into forward coordinates as `k - (pos_rc + m)`.
pub fn canonical_minimizer_pos(kmer: KmerWord, k: u64, m: u64, seed: u64) -> (u64, u64) {
    let (minimizer, pos) = compute_minimizer_pos(kmer, k, m, seed);
    let kmer_rc = encoding::reverse_complement(kmer, k);
    let (minimizer_rc, pos_rc) = compute_minimizer_pos(kmer_rc, k, m, seed);
    if minimizer_rc < minimizer {
        debug_assert!(k >= pos_rc + m);
        (minimizer_rc, k - (pos_rc + m))
    } else {
        (minimizer, pos)
    }
}
