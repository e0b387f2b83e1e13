//! Run-length encoded per-k-mer weights
//!
//! In weighted mode every k-mer of the input carries an integer weight,
//! listed in its record's header. The builder consumes weights in k-mer
//! stream order and collapses equal neighbours into `(value, length)`
//! intervals. The run state is global to the parse: equal weights on both
//! sides of a sequence boundary merge into one interval.

use crate::constants;

/// One maximal run of equal weights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightInterval {
    /// The weight value
    pub value: u64,
    /// How many consecutive k-mers carry it
    pub length: u64,
}

/// Accumulates the weight stream during parsing
pub struct WeightsBuilder {
    run_value: u64,
    run_length: u64,
    intervals: Vec<WeightInterval>,
    sum_of_weights: u64,
    num_weights: u64,
}

impl WeightsBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            run_value: constants::INVALID_UINT64,
            run_length: 0,
            intervals: Vec::new(),
            sum_of_weights: 0,
            num_weights: 0,
        }
    }

    /// Feed the next weight in k-mer stream order
    pub fn eat(&mut self, weight: u64) {
        self.sum_of_weights += weight;
        self.num_weights += 1;
        if weight == self.run_value {
            self.run_length += 1;
        } else {
            if self.run_value != constants::INVALID_UINT64 {
                self.intervals.push(WeightInterval {
                    value: self.run_value,
                    length: self.run_length,
                });
            }
            self.run_value = weight;
            self.run_length = 1;
        }
    }

    /// Sum of all weights eaten so far
    pub fn sum_of_weights(&self) -> u64 {
        self.sum_of_weights
    }

    /// Close the stream, pushing the pending run. The interval lengths must
    /// add up to the number of k-mers parsed.
    pub fn finalize(mut self, total_kmers: u64) -> WeightStream {
        if self.run_value != constants::INVALID_UINT64 {
            self.intervals.push(WeightInterval {
                value: self.run_value,
                length: self.run_length,
            });
        }
        debug_assert_eq!(self.num_weights, total_kmers);
        debug_assert_eq!(
            self.intervals.iter().map(|i| i.length).sum::<u64>(),
            total_kmers
        );
        WeightStream {
            intervals: self.intervals,
            sum_of_weights: self.sum_of_weights,
            num_weights: self.num_weights,
        }
    }
}

impl Default for WeightsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The finalized run-length weight stream
#[derive(Debug)]
pub struct WeightStream {
    intervals: Vec<WeightInterval>,
    sum_of_weights: u64,
    num_weights: u64,
}

impl WeightStream {
    /// The run-length intervals in stream order
    pub fn intervals(&self) -> &[WeightInterval] {
        &self.intervals
    }

    /// Sum of all weights
    pub fn sum_of_weights(&self) -> u64 {
        self.sum_of_weights
    }

    /// Total number of weights, equal to the number of k-mers
    pub fn num_weights(&self) -> u64 {
        self.num_weights
    }
}
