//! Streaming super-k-mer partitioning
//!
//! A single pass over the input drives everything: for every k-mer of every
//! sequence the minimizer is selected, consecutive k-mers keeping the same
//! minimizer instance are grouped into a super-k-mer, and each finished
//! super-k-mer lands in the string pool with a matching entry in the
//! external tuple list. Input is read as alternating header / sequence
//! lines; sequence lines may be arbitrarily long.
//!
//! A super-k-mer run continues only while the minimizer value is unchanged
//! *and* its window position has slid by exactly one base. The second test
//! keeps two independent occurrences of the same m-mer from being merged
//! into one super-k-mer.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::info;

use crate::config::BuildConfig;
use crate::constants::{self, PROGRESS_INTERVAL};
use crate::encoding;
use crate::error::Error;
use crate::kmer;
use crate::minimizer;
use crate::minimizer_tuples::{MinimizerTuples, MinimizerTuplesWriter, SuperKmerCount};
use crate::string_pool::{StringPool, StringPoolBuilder};
use crate::weights::{WeightStream, WeightsBuilder};

/// Everything a parse hands off to the downstream index builder
#[derive(Debug)]
pub struct ParseData {
    /// Total number of k-mers in the input
    pub num_kmers: u64,
    /// The compacted super-k-mer pool
    pub strings: StringPool,
    /// The insertion-ordered minimizer tuple list
    pub minimizers: MinimizerTuples,
    /// Run-length encoded weights, when parsing in weighted mode
    pub weights: Option<WeightStream>,
}

/// Parse a file, transparently decompressing a `.gz` suffix
pub fn parse_path(path: impl AsRef<Path>, config: &BuildConfig) -> Result<ParseData, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    info!("reading file '{}'", path.display());
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        parse_file(BufReader::new(MultiGzDecoder::new(file)), config)
    } else {
        parse_file(BufReader::new(file), config)
    }
}

/// Parse an already opened input stream
pub fn parse_file<R: BufRead>(mut reader: R, config: &BuildConfig) -> Result<ParseData, Error> {
    let k = config.k;
    let m = config.m;
    let seed = config.seed;

    let max_num_kmers_in_super_kmer = k - m + 1;
    if max_num_kmers_in_super_kmer >= (1u64 << SuperKmerCount::BITS) {
        return Err(Error::Config(format!(
            "a super-k-mer can hold up to {} k-mers, which does not fit into {} bits",
            max_num_kmers_in_super_kmer,
            SuperKmerCount::BITS
        )));
    }

    let mut num_kmers = 0u64;
    let mut builder = StringPoolBuilder::new(k);
    let mut minimizers = MinimizerTuplesWriter::new(&config.tmp_dirname)?;
    let mut weights_builder = WeightsBuilder::new();

    let mut header = String::new();
    let mut sequence = String::new();
    let mut num_sequences = 0u64;
    let mut num_bases = 0u64;

    loop {
        header.clear();
        if reader.read_line(&mut header)? == 0 {
            break;
        }
        trim_newline(&mut header);

        let declared_len = if config.weighted && !header.is_empty() {
            Some(parse_weighted_header(&header, k, &mut weights_builder)?)
        } else {
            None
        };

        sequence.clear();
        let read = reader.read_line(&mut sequence)?;
        trim_newline(&mut sequence);

        if let Some(declared) = declared_len {
            if declared != sequence.len() as u64 {
                return Err(Error::Format(format!(
                    "expected a sequence of length {} but got one of length {}",
                    declared,
                    sequence.len()
                )));
            }
        }
        if read == 0 {
            break;
        }
        if (sequence.len() as u64) < k {
            continue;
        }

        let seq = sequence.as_bytes();
        if let Some(pos) = encoding::first_invalid(seq) {
            return Err(Error::Format(format!(
                "invalid base {:?} at position {} of sequence {}",
                seq[pos] as char, pos, num_sequences
            )));
        }

        num_sequences += 1;
        if num_sequences % PROGRESS_INTERVAL == 0 {
            info!(
                "read {} sequences, {} bases, {} kmers",
                num_sequences, num_bases, num_kmers
            );
        }
        num_bases += seq.len() as u64;

        let mut begin = 0u64; // first k-mer of the open super-k-mer
        let mut glue = false; // whether the next append continues this piece
        let mut prev_minimizer = constants::INVALID_UINT64;
        let mut prev_pos = constants::INVALID_UINT64;

        let num_kmers_in_sequence = seq.len() as u64 - k + 1;
        for end in 0..num_kmers_in_sequence {
            let uint_kmer = kmer::pack_no_reverse(&seq[end as usize..], k);
            let (minimizer, pos) = if config.canonical_parsing {
                minimizer::canonical_minimizer_pos(uint_kmer, k, m, seed)
            } else {
                minimizer::compute_minimizer_pos(uint_kmer, k, m, seed)
            };

            if prev_minimizer == constants::INVALID_UINT64 {
                prev_minimizer = minimizer;
                // sentinel: neither break test below can fire on this k-mer
                prev_pos = pos + 1;
            }
            if minimizer != prev_minimizer || pos + 1 != prev_pos {
                append_super_kmer(
                    seq,
                    k,
                    begin,
                    end,
                    prev_minimizer,
                    glue,
                    &mut builder,
                    &mut minimizers,
                )?;
                begin = end;
                prev_minimizer = minimizer;
                glue = true;
            }

            num_kmers += 1;
            prev_pos = pos;
        }

        append_super_kmer(
            seq,
            k,
            begin,
            num_kmers_in_sequence,
            prev_minimizer,
            glue,
            &mut builder,
            &mut minimizers,
        )?;
    }

    let strings = builder.finalize();
    let minimizers = minimizers.finalize()?;

    info!(
        "read {} sequences, {} bases, {} kmers",
        num_sequences, num_bases, num_kmers
    );
    info!("num_kmers {}", num_kmers);
    info!("num_super_kmers {}", strings.num_super_kmers());
    let pieces_overhead = if num_kmers > 0 {
        (2.0 * strings.pieces().len() as f64 * (k - 1) as f64) / num_kmers as f64
    } else {
        0.0
    };
    info!(
        "num_pieces {} (+{:.3} [bits/kmer])",
        strings.pieces().len(),
        pieces_overhead
    );
    debug_assert_eq!(strings.pieces().len() as u64, num_sequences + 1);

    let weights = if config.weighted {
        info!("sum_of_weights {}", weights_builder.sum_of_weights());
        Some(weights_builder.finalize(num_kmers))
    } else {
        None
    };

    Ok(ParseData {
        num_kmers,
        strings,
        minimizers,
        weights,
    })
}

/// Emit the super-k-mer covering k-mer indices `[begin, end)` of `seq`.
///
/// No-op when the run is empty. The tuple records the pool offset before the
/// append; for a glued super-k-mer that offset is then rewound by `k - 1`,
/// because the run's first k-mer starts inside the tail of the previous
/// super-k-mer.
#[allow(clippy::too_many_arguments)]
fn append_super_kmer(
    seq: &[u8],
    k: u64,
    begin: u64,
    end: u64,
    prev_minimizer: u64,
    glue: bool,
    builder: &mut StringPoolBuilder,
    minimizers: &mut MinimizerTuplesWriter,
) -> Result<(), Error> {
    if seq.is_empty() || prev_minimizer == constants::INVALID_UINT64 || begin == end {
        return Ok(());
    }
    debug_assert!(end > begin);
    let size = (end - begin) + k - 1;
    let super_kmer = &seq[begin as usize..(begin + size) as usize];
    debug_assert!(encoding::is_valid(super_kmer));
    let num_kmers_in_super_kmer = end - begin;
    debug_assert!(num_kmers_in_super_kmer <= SuperKmerCount::MAX as u64);
    minimizers.emplace_back(
        prev_minimizer,
        builder.offset(),
        num_kmers_in_super_kmer as SuperKmerCount,
    )?;
    builder.append(super_kmer, size, glue);
    if glue {
        if let Some(last) = minimizers.back_mut() {
            debug_assert!(last.offset > k - 1);
            last.offset -= k - 1;
        }
    }
    Ok(())
}

fn trim_newline(line: &mut String) {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
}

/// Parse a weighted header of the form
/// `>[id] LN:i:[len] ab:Z:[w0] [w1] ...`, feeding the `len - k + 1` weights
/// to the builder. Returns the declared sequence length.
///
/// Integers are scanned in place; nothing is tokenized or allocated.
fn parse_weighted_header(
    header: &str,
    k: u64,
    weights: &mut WeightsBuilder,
) -> Result<u64, Error> {
    let bytes = header.as_bytes();
    if bytes.first() != Some(&b'>') {
        return Err(Error::Format("header does not start with '>'".into()));
    }
    let mut i = bytes
        .iter()
        .position(|&c| c == b' ')
        .ok_or_else(|| Error::Format("header has no fields after the id".into()))?
        + 1;
    if bytes.get(i..i + 5) != Some(b"LN:i:".as_slice()) {
        return Err(Error::Format(
            "header is missing the LN:i: length field".into(),
        ));
    }
    i += 5;
    let (seq_len, next) = scan_u64(bytes, i)?;
    i = next;
    if bytes.get(i..i + 6) != Some(b" ab:Z:".as_slice()) {
        return Err(Error::Format(
            "header is missing the ab:Z: weights field".into(),
        ));
    }
    i += 6;

    let num_weights = (seq_len + 1).saturating_sub(k);
    for _ in 0..num_weights {
        while bytes.get(i) == Some(&b' ') {
            i += 1;
        }
        let (weight, next) = scan_u64(bytes, i)?;
        i = next;
        weights.eat(weight);
    }
    Ok(seq_len)
}

/// Scan a decimal unsigned integer at position `i`, returning the value and
/// the position of the first byte after it
fn scan_u64(bytes: &[u8], mut i: usize) -> Result<(u64, usize), Error> {
    let start = i;
    let mut value: u64 = 0;
    while let Some(c) = bytes.get(i) {
        if !c.is_ascii_digit() {
            break;
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((c - b'0') as u64))
            .ok_or_else(|| Error::Format("integer overflow in header".into()))?;
        i += 1;
    }
    if i == start {
        return Err(Error::Format(
            "expected an unsigned integer in header".into(),
        ));
    }
    Ok((value, i))
}
