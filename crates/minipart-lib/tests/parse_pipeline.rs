//! Integration tests for the partitioning pipeline
//!
//! These exercise the full parse from raw input to finalized handles and
//! verify the structural invariants the downstream builder relies on: k-mer
//! totals, piece boundaries, tuple count bounds, and bijective
//! reconstruction of the input from pool and tuples.

use std::collections::HashMap;
use std::io::Cursor;

use minipart_lib::encoding;
use minipart_lib::parse::{parse_file, parse_path, ParseData};
use minipart_lib::BuildConfig;

fn config(k: u64, m: u64, seed: u64) -> BuildConfig {
    BuildConfig {
        k,
        m,
        seed,
        ..BuildConfig::default()
    }
}

/// Check the parse output against its input sequences.
///
/// Sequences shorter than k must have been skipped; every remaining one must
/// decode back out of its pool piece; and the tuples must tile each piece
/// exactly, with consecutive tuples advancing by the previous tuple's k-mer
/// count (the k-1 base overlap of glued super-k-mers collapsed).
fn verify(data: &ParseData, inputs: &[&str], k: u64, m: u64) {
    let kept: Vec<&str> = inputs
        .iter()
        .copied()
        .filter(|s| s.len() as u64 >= k)
        .collect();

    let expected_kmers: u64 = kept.iter().map(|s| s.len() as u64 - k + 1).sum();
    assert_eq!(data.num_kmers, expected_kmers);

    let pieces = data.strings.pieces();
    assert_eq!(pieces.len(), kept.len() + 1);
    for (i, seq) in kept.iter().enumerate() {
        let begin = pieces[i];
        let end = pieces[i + 1];
        assert_eq!(end - begin, seq.len() as u64, "piece {} length", i);
        assert_eq!(data.strings.decode(begin, end - begin), *seq, "piece {}", i);
    }

    let max_count = k - m + 1;
    let mut piece = 0usize;
    let mut expected_offset = pieces[0];
    let mut total_kmers = 0u64;
    for (idx, tuple) in data.minimizers.iter().enumerate() {
        let count = tuple.num_kmers_in_super_kmer as u64;
        assert!(count >= 1 && count <= max_count, "tuple {} count", idx);
        assert_eq!(tuple.offset, expected_offset, "tuple {} offset", idx);
        total_kmers += count;
        expected_offset = tuple.offset + count;
        if piece + 1 < pieces.len() && expected_offset + k - 1 == pieces[piece + 1] {
            piece += 1;
            expected_offset = pieces[piece];
        }
    }
    assert_eq!(piece + 1, pieces.len(), "all pieces covered by tuples");
    assert_eq!(total_kmers, data.num_kmers);
    assert_eq!(data.minimizers.len(), data.strings.num_super_kmers());
}

#[test]
fn test_single_sequence() {
    let data = parse_file(Cursor::new(">s1\nACGTACGT\n"), &config(5, 3, 1)).unwrap();
    assert_eq!(data.num_kmers, 4);
    assert_eq!(data.strings.num_bases(), 8);
    assert_eq!(data.strings.pieces()[0], 0);
    assert!(data.strings.num_super_kmers() >= 1);
    verify(&data, &["ACGTACGT"], 5, 3);
}

#[test]
fn test_single_kmer() {
    let data = parse_file(Cursor::new(">s1\nAAAAA\n"), &config(5, 3, 1)).unwrap();
    assert_eq!(data.num_kmers, 1);
    assert_eq!(data.strings.num_super_kmers(), 1);
    assert_eq!(data.minimizers.len(), 1);
    assert_eq!(data.minimizers.get(0).num_kmers_in_super_kmer, 1);
    verify(&data, &["AAAAA"], 5, 3);
}

#[test]
fn test_short_sequence_skipped() {
    let data = parse_file(Cursor::new(">s1\nACG\n"), &config(5, 3, 1)).unwrap();
    assert_eq!(data.num_kmers, 0);
    assert_eq!(data.strings.pieces().len(), 1);
    verify(&data, &["ACG"], 5, 3);
}

#[test]
fn test_two_sequences() {
    let input = ">s1\nACGTACGTACGT\n>s2\nTTTTTACGT\n";
    let data = parse_file(Cursor::new(input), &config(5, 3, 1)).unwrap();
    verify(&data, &["ACGTACGTACGT", "TTTTTACGT"], 5, 3);

    let pieces = data.strings.pieces();
    assert_eq!(pieces.len(), 3);
    // tuples of s1 precede tuples of s2 in insertion order
    let tuples: Vec<_> = data.minimizers.iter().collect();
    let first_of_s2 = tuples
        .iter()
        .position(|t| t.offset >= pieces[1])
        .expect("s2 has at least one tuple");
    assert!(tuples[..first_of_s2].iter().all(|t| t.offset < pieces[1]));
    assert!(tuples[first_of_s2..].iter().all(|t| t.offset >= pieces[1]));
}

#[test]
fn test_mixed_lengths() {
    let input = ">a\nACGTACG\n>b\nAC\n>c\nGGGGGTTTTTACGTACGTAC\n>d\nT\n";
    let data = parse_file(Cursor::new(input), &config(5, 3, 1)).unwrap();
    verify(
        &data,
        &["ACGTACG", "AC", "GGGGGTTTTTACGTACGTAC", "T"],
        5,
        3,
    );
}

#[test]
fn test_long_pseudo_random_sequence() {
    // deterministic LCG-generated input, long enough to break into many
    // super-k-mers
    let mut state = 42u64;
    let mut seq = String::new();
    for _ in 0..997 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        seq.push(['A', 'C', 'G', 'T'][(state >> 33) as usize % 4]);
    }
    let input = format!(">s1\n{}\n", seq);

    let data = parse_file(Cursor::new(input.clone()), &config(31, 13, 1)).unwrap();
    assert_eq!(data.num_kmers, 997 - 31 + 1);
    assert!(data.strings.num_super_kmers() > 1);
    verify(&data, &[seq.as_str()], 31, 13);
}

#[test]
fn test_different_seeds_both_valid() {
    let mut state = 7u64;
    let mut seqs = Vec::new();
    for _ in 0..5 {
        let mut seq = String::new();
        for _ in 0..211 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            seq.push(['A', 'C', 'G', 'T'][(state >> 33) as usize % 4]);
        }
        seqs.push(seq);
    }
    let input: String = seqs.iter().map(|s| format!(">h\n{}\n", s)).collect();
    let inputs: Vec<&str> = seqs.iter().map(|s| s.as_str()).collect();

    for seed in [1u64, 42] {
        let data = parse_file(Cursor::new(input.clone()), &config(15, 7, seed)).unwrap();
        verify(&data, &inputs, 15, 7);
    }
}

#[test]
fn test_canonical_matches_reverse_complement_input() {
    // in canonical mode a sequence and its reverse complement select the
    // same minimizer values, so the per-minimizer k-mer counts agree
    let seq = "ACGGTTACACGGTTAAGGCACCA";
    let rc: String = encoding::reverse_complement_seq(seq.as_bytes())
        .iter()
        .map(|&b| b as char)
        .collect();

    let mut cfg = config(5, 3, 1);
    cfg.canonical_parsing = true;

    let fwd = parse_file(Cursor::new(format!(">s\n{}\n", seq)), &cfg).unwrap();
    let bwd = parse_file(Cursor::new(format!(">s\n{}\n", rc)), &cfg).unwrap();
    verify(&fwd, &[seq], 5, 3);
    verify(&bwd, &[rc.as_str()], 5, 3);

    let kmers_per_minimizer = |data: &ParseData| {
        let mut map: HashMap<u64, u64> = HashMap::new();
        for t in data.minimizers.iter() {
            *map.entry(t.minimizer).or_default() += t.num_kmers_in_super_kmer as u64;
        }
        map
    };
    assert_eq!(kmers_per_minimizer(&fwd), kmers_per_minimizer(&bwd));
}

#[test]
fn test_weighted_pipeline() {
    let mut cfg = config(2, 1, 1);
    cfg.weighted = true;
    let input = ">1 LN:i:6 ab:Z:2 2 2 3 3\nACGTAC\n";
    let data = parse_file(Cursor::new(input), &cfg).unwrap();
    verify(&data, &["ACGTAC"], 2, 1);

    let weights = data.weights.expect("weighted parse produces a stream");
    let intervals = weights.intervals();
    assert_eq!(intervals.len(), 2);
    assert_eq!((intervals[0].value, intervals[0].length), (2, 3));
    assert_eq!((intervals[1].value, intervals[1].length), (3, 2));
    assert_eq!(weights.sum_of_weights(), 12);
    assert_eq!(weights.num_weights(), data.num_kmers);
}

#[test]
fn test_weight_runs_merge_across_sequences() {
    let mut cfg = config(3, 1, 1);
    cfg.weighted = true;
    // both records end/start with weight 7: one merged interval
    let input = ">1 LN:i:4 ab:Z:7 7\nACGT\n>2 LN:i:4 ab:Z:7 5\nTTTT\n";
    let data = parse_file(Cursor::new(input), &cfg).unwrap();
    let weights = data.weights.unwrap();
    let intervals = weights.intervals();
    assert_eq!(intervals.len(), 2);
    assert_eq!((intervals[0].value, intervals[0].length), (7, 3));
    assert_eq!((intervals[1].value, intervals[1].length), (5, 1));
}

#[test]
fn test_parse_path_gzip() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("input.gz");
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(b">s1\nACGTACGTACGT\n").unwrap();
    encoder.finish().unwrap();

    let data = parse_path(&path, &config(5, 3, 1)).unwrap();
    assert_eq!(data.num_kmers, 8);
    verify(&data, &["ACGTACGTACGT"], 5, 3);
}

#[test]
fn test_parse_path_missing_file() {
    let err = parse_path("/no/such/file", &config(5, 3, 1)).unwrap_err();
    assert!(matches!(err, minipart_lib::Error::Open { .. }));
}
