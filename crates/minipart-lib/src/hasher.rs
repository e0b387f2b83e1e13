//! Seeded hashing for minimizer selection.
//!
//! The bucket layout of the downstream index is a function of these hash
//! values, so the algorithm is fixed: 64-bit MurmurHash2 (the 64A variant)
//! over the little-endian byte representation of the packed word. Words are
//! serialized little-endian before hashing regardless of host endianness so
//! that indexes built on different machines agree bit for bit.

const M: u64 = 0xc6a4_a793_5bd1_e995;
const R: u32 = 47;

/// MurmurHash2, 64-bit version (MurmurHash64A), seeded
pub fn murmurhash2_64(bytes: &[u8], seed: u64) -> u64 {
    let len = bytes.len();
    let mut h: u64 = seed ^ (len as u64).wrapping_mul(M);

    let mut chunks = bytes.chunks_exact(8);
    for chunk in &mut chunks {
        let mut k = u64::from_le_bytes(chunk.try_into().expect("chunk is 8 bytes"));
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h ^= k;
        h = h.wrapping_mul(M);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut last = 0u64;
        for (i, &b) in tail.iter().enumerate() {
            last |= (b as u64) << (8 * i);
        }
        h ^= last;
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;
    h
}

/// Hash a single 64-bit word (the m-mer case)
#[inline]
pub fn hash_u64(x: u64, seed: u64) -> u64 {
    murmurhash2_64(&x.to_le_bytes(), seed)
}

/// Hash a 128-bit k-mer word: each 64-bit half is hashed with the same seed
/// and the results are XORed
#[inline]
pub fn hash_kmer(x: u128, seed: u64) -> u64 {
    hash_u64(x as u64, seed) ^ hash_u64((x >> 64) as u64, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_zero_seed() {
        // with no input and seed 0 every mixing step is a no-op
        assert_eq!(murmurhash2_64(&[], 0), 0);
    }

    #[test]
    fn test_deterministic() {
        let x = 0x0123_4567_89ab_cdefu64;
        assert_eq!(hash_u64(x, 1), hash_u64(x, 1));
        assert_ne!(hash_u64(x, 1), hash_u64(x, 2));
        assert_ne!(hash_u64(x, 1), hash_u64(x.wrapping_add(1), 1));
    }

    #[test]
    fn test_tail_bytes_contribute() {
        assert_ne!(murmurhash2_64(b"ACGTA", 1), murmurhash2_64(b"ACGTC", 1));
        assert_ne!(murmurhash2_64(b"ACGT", 1), murmurhash2_64(b"ACGTA", 1));
    }

    #[test]
    fn test_hash_u64_matches_byte_form() {
        let x = 0xdead_beef_cafe_f00du64;
        assert_eq!(hash_u64(x, 7), murmurhash2_64(&x.to_le_bytes(), 7));
    }

    #[test]
    fn test_hash_kmer_low_half() {
        // a k-mer word with an empty high half hashes as low ^ hash(0)
        let x = 0x1234u128;
        assert_eq!(hash_kmer(x, 3), hash_u64(0x1234, 3) ^ hash_u64(0, 3));
    }
}
