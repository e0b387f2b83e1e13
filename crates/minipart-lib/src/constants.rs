//! Constants shared across the partitioning pipeline.

/// Invalid value sentinel for 64-bit quantities
pub const INVALID_UINT64: u64 = u64::MAX;

/// Default seed for the minimizer hash
pub const DEFAULT_SEED: u64 = 1;

/// Max *odd* k-mer size that fits a 128-bit word at 2 bits per base
pub const MAX_K: u64 = 63;

/// Max *odd* minimizer size that fits a 64-bit word at 2 bits per base
pub const MAX_M: u64 = 31;

/// Smallest value of the downstream bucket-size knob `l`
pub const MIN_L: u64 = 6;

/// Largest value of the downstream bucket-size knob `l`
pub const MAX_L: u64 = 12;

/// Default value of the downstream PTHash trade-off knob `c`
pub const DEFAULT_C: f64 = 3.0;

/// A progress line is logged every this many parsed sequences
pub const PROGRESS_INTERVAL: u64 = 100_000;
