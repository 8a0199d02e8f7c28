//! Bounded in-memory sample buffer with flush-to-file persistence.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One timestamped measurement. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<V> {
    /// Seconds since the unix epoch.
    pub timestamp: i64,
    pub value: V,
}

impl<V> Sample<V> {
    pub fn new(timestamp: i64, value: V) -> Self {
        Self { timestamp, value }
    }
}

/// Fixed-capacity buffer of samples for one metric stream, bound to one
/// output file.
///
/// Appending the sample that fills the buffer triggers a synchronous flush,
/// so the tick that fills it pays the I/O cost. Each flush rewrites the file
/// from scratch (truncate-on-open): the file always holds exactly the batch
/// since the previous flush, and flushing an empty buffer leaves an empty
/// file.
#[derive(Debug)]
pub struct SampleBuffer<V> {
    samples: Vec<Sample<V>>,
    capacity: usize,
    path: PathBuf,
}

impl<V: Display + Copy> SampleBuffer<V> {
    /// Creates an empty buffer that flushes to `path` when `capacity`
    /// samples have accumulated.
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            path: path.into(),
        }
    }

    /// Appends a sample, flushing when the buffer reaches capacity.
    ///
    /// This is the only path that grows the buffer. The returned error is
    /// the flush error, if any; the sample itself is always recorded (and
    /// then cleared along with the rest of the batch when the flush runs).
    pub fn append(&mut self, sample: Sample<V>) -> io::Result<()> {
        self.samples.push(sample);
        if self.samples.len() >= self.capacity {
            return self.flush();
        }
        Ok(())
    }

    /// Writes every buffered sample, in order, to the output file and
    /// empties the buffer.
    ///
    /// The buffer is cleared even when the write fails: a lost batch must
    /// not block future appends or grow the buffer past its capacity.
    /// Invocable at any fill level; the shutdown path uses this to force
    /// out partial batches.
    pub fn flush(&mut self) -> io::Result<()> {
        let result = write_samples(&self.path, &self.samples);
        self.samples.clear();
        result
    }

    /// Number of buffered (unflushed) samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered samples, oldest first.
    pub fn samples(&self) -> &[Sample<V>] {
        &self.samples
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One `"<timestamp> <value>"` line per sample, truncating any previous
/// file content.
fn write_samples<V: Display + Copy>(path: &Path, samples: &[Sample<V>]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for sample in samples {
        writeln!(writer, "{} {}", sample.timestamp, sample.value)?;
    }
    writer.flush()
}
