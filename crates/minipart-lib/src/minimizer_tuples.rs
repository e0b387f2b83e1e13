//! External-memory sink for minimizer tuples
//!
//! The driver emits one `(minimizer, offset, count)` tuple per super-k-mer,
//! in insertion order. Tuples are buffered in memory and spilled to a single
//! binary file under the configured temporary directory when the buffer
//! fills; appending to one file keeps insertion order without a merge step.
//! Sorting and balancing belong to the downstream builder.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use memmap2::Mmap;

/// Integer type of the per-tuple k-mer count; `k - m + 1` must fit
pub type SuperKmerCount = u8;

/// On-disk size of one tuple: minimizer (8) + offset (8) + count (1)
pub const TUPLE_SIZE_BYTES: usize = 17;

/// One super-k-mer's entry in the external tuple list.
///
/// `offset` is measured in bases from the start of the string pool and
/// points at the first base of the super-k-mer's first k-mer. For glued
/// super-k-mers that base lies in the tail of the previous super-k-mer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimizerTuple {
    /// The minimizer value (2-bit packed m-mer)
    pub minimizer: u64,
    /// Base offset of the super-k-mer's first k-mer in the string pool
    pub offset: u64,
    /// Number of k-mers in the super-k-mer, in `1..=(k - m + 1)`
    pub num_kmers_in_super_kmer: SuperKmerCount,
}

impl MinimizerTuple {
    /// Serialize to the little-endian on-disk layout
    pub fn to_bytes(&self) -> [u8; TUPLE_SIZE_BYTES] {
        let mut buf = [0u8; TUPLE_SIZE_BYTES];
        buf[0..8].copy_from_slice(&self.minimizer.to_le_bytes());
        buf[8..16].copy_from_slice(&self.offset.to_le_bytes());
        buf[16] = self.num_kmers_in_super_kmer;
        buf
    }

    /// Deserialize from the little-endian on-disk layout
    pub fn from_bytes(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= TUPLE_SIZE_BYTES);
        let mut minimizer = [0u8; 8];
        let mut offset = [0u8; 8];
        minimizer.copy_from_slice(&buf[0..8]);
        offset.copy_from_slice(&buf[8..16]);
        Self {
            minimizer: u64::from_le_bytes(minimizer),
            offset: u64::from_le_bytes(offset),
            num_kmers_in_super_kmer: buf[16],
        }
    }
}

/// Default in-memory buffer capacity, in tuples (~64 MiB)
const DEFAULT_BUFFER_CAPACITY: usize = 1 << 22;

/// Append-only writer for minimizer tuples with disk spill
pub struct MinimizerTuplesWriter {
    tmp_dir: PathBuf,
    run_id: u64,
    capacity: usize,
    buffer: Vec<MinimizerTuple>,
    spill: Option<BufWriter<File>>,
    num_spilled: u64,
}

impl MinimizerTuplesWriter {
    /// Create a writer spilling under `tmp_dir` with the default buffer size
    pub fn new(tmp_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::with_capacity(tmp_dir, DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a writer with an explicit in-memory buffer capacity
    pub fn with_capacity(tmp_dir: impl AsRef<Path>, capacity: usize) -> std::io::Result<Self> {
        let tmp_dir = tmp_dir.as_ref().to_path_buf();
        fs::create_dir_all(&tmp_dir)?;
        let run_id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Ok(Self {
            tmp_dir,
            run_id,
            capacity: capacity.max(1),
            buffer: Vec::new(),
            spill: None,
            num_spilled: 0,
        })
    }

    fn spill_path(&self) -> PathBuf {
        self.tmp_dir
            .join(format!("minipart.tmp.run_{}.minimizers.bin", self.run_id))
    }

    /// Append one tuple
    pub fn emplace_back(
        &mut self,
        minimizer: u64,
        offset: u64,
        num_kmers_in_super_kmer: SuperKmerCount,
    ) -> std::io::Result<()> {
        if self.buffer.len() == self.capacity {
            self.flush_buffer()?;
        }
        self.buffer.push(MinimizerTuple {
            minimizer,
            offset,
            num_kmers_in_super_kmer,
        });
        Ok(())
    }

    /// The most recently appended tuple. The driver rewinds glued offsets
    /// through this right after `emplace_back`, so the tuple is always still
    /// buffered.
    pub fn back_mut(&mut self) -> Option<&mut MinimizerTuple> {
        self.buffer.last_mut()
    }

    /// Total number of tuples appended so far
    pub fn len(&self) -> u64 {
        self.num_spilled + self.buffer.len() as u64
    }

    /// Whether no tuple has been appended
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn flush_buffer(&mut self) -> std::io::Result<()> {
        if self.spill.is_none() {
            let file = File::create(self.spill_path())?;
            self.spill = Some(BufWriter::with_capacity(1 << 20, file));
        }
        let writer = self.spill.as_mut().expect("spill writer just created");
        for tuple in &self.buffer {
            writer.write_all(&tuple.to_bytes())?;
        }
        self.num_spilled += self.buffer.len() as u64;
        self.buffer.clear();
        Ok(())
    }

    /// Freeze the writer into an iterable handle. Buffered tuples either stay
    /// in memory or, when a spill happened, join the spill file which is then
    /// memory-mapped.
    pub fn finalize(mut self) -> std::io::Result<MinimizerTuples> {
        if self.spill.is_none() {
            let tuples = std::mem::take(&mut self.buffer);
            return Ok(MinimizerTuples {
                num_tuples: tuples.len() as u64,
                backing: Backing::Memory(tuples),
            });
        }

        let path = self.spill_path();
        let result: std::io::Result<Mmap> = (|| {
            self.flush_buffer()?;
            let mut writer = self.spill.take().expect("spill exists on this path");
            writer.flush()?;
            drop(writer);
            let file = File::open(&path)?;
            // Safety: the spill file is private to this run and not modified
            // after the writer is dropped.
            unsafe { Mmap::map(&file) }
        })();
        match result {
            Ok(mmap) => Ok(MinimizerTuples {
                num_tuples: self.num_spilled,
                backing: Backing::Spilled { path, mmap },
            }),
            Err(e) => {
                let _ = fs::remove_file(&path);
                Err(e)
            }
        }
    }
}

impl Drop for MinimizerTuplesWriter {
    fn drop(&mut self) {
        // a writer abandoned before finalize removes its spill file
        if self.spill.take().is_some() {
            let _ = fs::remove_file(self.spill_path());
        }
    }
}

#[derive(Debug)]
enum Backing {
    Memory(Vec<MinimizerTuple>),
    Spilled { path: PathBuf, mmap: Mmap },
}

/// The finalized, insertion-ordered tuple list handed to the downstream
/// builder
#[derive(Debug)]
pub struct MinimizerTuples {
    num_tuples: u64,
    backing: Backing,
}

impl MinimizerTuples {
    /// Number of tuples
    pub fn len(&self) -> u64 {
        self.num_tuples
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.num_tuples == 0
    }

    /// Tuple at index `i` in insertion order
    pub fn get(&self, i: u64) -> MinimizerTuple {
        debug_assert!(i < self.num_tuples);
        match &self.backing {
            Backing::Memory(v) => v[i as usize],
            Backing::Spilled { mmap, .. } => {
                let begin = i as usize * TUPLE_SIZE_BYTES;
                MinimizerTuple::from_bytes(&mmap[begin..begin + TUPLE_SIZE_BYTES])
            }
        }
    }

    /// Iterate the tuples in insertion order
    pub fn iter(&self) -> impl Iterator<Item = MinimizerTuple> + '_ {
        (0..self.num_tuples).map(|i| self.get(i))
    }
}

impl Drop for MinimizerTuples {
    fn drop(&mut self) {
        if let Backing::Spilled { path, .. } = &self.backing {
            let _ = fs::remove_file(path);
        }
    }
}
