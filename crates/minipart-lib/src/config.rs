//! Build configuration
//!
//! Parameters for a parse run, mirroring the knobs accepted by the
//! command-line front-end. `l` and `c` are consumed by the downstream index
//! builder and only forwarded here.

use crate::constants::{DEFAULT_C, DEFAULT_SEED, MAX_K, MAX_M, MIN_L};
use crate::error::Error;
use std::path::PathBuf;

/// Configuration for parsing an input file into super-k-mers
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// K-mer length (odd, `1..=63`)
    pub k: u64,

    /// Minimizer length (odd, `m <= k` and `m <= 31`)
    pub m: u64,

    /// Seed for the minimizer hash
    pub seed: u64,

    /// Downstream bucket-size knob, forwarded untouched
    pub l: u64,

    /// Downstream PTHash trade-off knob, forwarded untouched
    pub c: f64,

    /// Replace each k-mer by the smaller of itself and its reverse
    /// complement before minimizer selection
    pub canonical_parsing: bool,

    /// Headers carry per-k-mer weights
    pub weighted: bool,

    /// Verbose output during parsing
    pub verbose: bool,

    /// Directory for the tuple writer's spill files
    pub tmp_dirname: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            k: 31,
            m: 17,
            seed: DEFAULT_SEED,
            l: MIN_L,
            c: DEFAULT_C,
            canonical_parsing: false,
            weighted: false,
            verbose: true,
            tmp_dirname: PathBuf::from("."),
        }
    }
}

impl BuildConfig {
    /// Create a validated configuration for the given k-mer and minimizer
    /// lengths
    pub fn new(k: u64, m: u64) -> Result<Self, Error> {
        let config = Self {
            k,
            m,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<(), Error> {
        if self.k % 2 == 0 {
            return Err(Error::Config(format!("k must be odd, got k={}", self.k)));
        }
        if self.k == 0 || self.k > MAX_K {
            return Err(Error::Config(format!(
                "k must be in [1, {}], got k={}",
                MAX_K, self.k
            )));
        }
        if self.m % 2 == 0 {
            return Err(Error::Config(format!("m must be odd, got m={}", self.m)));
        }
        if self.m > self.k {
            return Err(Error::Config(format!(
                "m must not exceed k, got m={}, k={}",
                self.m, self.k
            )));
        }
        if self.m > MAX_M {
            return Err(Error::Config(format!(
                "m must be at most {}, got m={}",
                MAX_M, self.m
            )));
        }
        Ok(())
    }

    /// Largest number of k-mers a super-k-mer can hold
    pub fn max_num_kmers_in_super_kmer(&self) -> u64 {
        self.k - self.m + 1
    }

    /// Log the configuration via tracing
    pub fn print(&self) {
        tracing::info!(
            "k = {}, m = {}, seed = {}, canonical_parsing = {}, weighted = {}",
            self.k,
            self.m,
            self.seed,
            self.canonical_parsing,
            self.weighted
        );
        tracing::debug!("l = {}, c = {}", self.l, self.c);
        tracing::debug!("tmp_dirname = {:?}", self.tmp_dirname);
    }
}
