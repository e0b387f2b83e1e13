// minipart: minimizer-partitioned super-k-mer extraction
//
// A streaming parser that turns DNA sequences into the intermediate data
// structures of a minimizer-partitioned k-mer dictionary: a compacted
// super-k-mer string pool, an external minimizer tuple list, and optional
// run-length encoded k-mer weights.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod hasher;
pub mod kmer;
pub mod minimizer;
pub mod minimizer_tuples;
pub mod parse;
pub mod string_pool;
pub mod weights;

// Re-export common types at crate root
pub use config::BuildConfig;
pub use error::Error;
pub use minimizer_tuples::{MinimizerTuple, MinimizerTuples, MinimizerTuplesWriter};
pub use parse::{parse_file, parse_path, ParseData};
pub use string_pool::{StringPool, StringPoolBuilder};
pub use weights::{WeightStream, WeightsBuilder};
