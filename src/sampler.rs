//! The sampling loop: one tick per interval, three readers in fixed order,
//! shutdown flush driven by a cancellation flag.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::collector::traits::FileSystem;
use crate::collector::{ProcessFamilyCollector, SystemCollector};
use crate::storage::{Sample, SampleBuffer};

/// Output file for the system-wide used-memory stream.
pub const TOTAL_MEM_FILENAME: &str = "total_mem_usage.txt";
/// Output file for the process-family resident-memory stream.
pub const FAMILY_MEM_FILENAME: &str = "proc_mem_usage.txt";
/// Output file for the CPU utilization stream.
pub const CPU_FILENAME: &str = "cpu_usage.txt";

/// Granularity of the end-of-tick sleep, so a shutdown signal is observed
/// promptly instead of after a full interval.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Sampler configuration.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Wall-clock spacing between ticks.
    pub interval: Duration,
    /// Per-stream buffer capacity; reaching it triggers a flush.
    pub capacity: usize,
    /// Command-name fragment selecting the process family.
    pub family_name: String,
    /// Directory the three output files are written into.
    pub output_dir: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            capacity: 4096,
            family_name: "tensorflow".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Owns the collectors and the three per-stream buffers, and drives the
/// tick loop.
///
/// All sampling state lives here: the CPU delta state inside the system
/// collector and the unflushed samples inside the buffers. Nothing is
/// global, so two samplers can coexist (as tests do).
pub struct Sampler<F: FileSystem> {
    system: SystemCollector<F>,
    family: ProcessFamilyCollector<F>,
    family_name: String,
    interval: Duration,
    total_mem: SampleBuffer<u64>,
    family_mem: SampleBuffer<i64>,
    cpu: SampleBuffer<f64>,
}

impl<F: FileSystem + Clone> Sampler<F> {
    /// Creates a sampler reading from `proc_path` through `fs`.
    pub fn new(fs: F, proc_path: impl Into<String>, config: SamplerConfig) -> Self {
        let proc_path = proc_path.into();
        Self {
            system: SystemCollector::new(fs.clone(), &proc_path),
            family: ProcessFamilyCollector::new(fs, &proc_path),
            family_name: config.family_name,
            interval: config.interval,
            total_mem: SampleBuffer::new(
                config.output_dir.join(TOTAL_MEM_FILENAME),
                config.capacity,
            ),
            family_mem: SampleBuffer::new(
                config.output_dir.join(FAMILY_MEM_FILENAME),
                config.capacity,
            ),
            cpu: SampleBuffer::new(config.output_dir.join(CPU_FILENAME), config.capacity),
        }
    }

    /// Performs one sampling tick.
    ///
    /// Readers run in a fixed order (total memory, process-family memory,
    /// CPU) and each result lands in its buffer before the next reader
    /// runs. All three samples of a tick share one timestamp. Flush
    /// failures are logged and swallowed; a tick never aborts the loop.
    pub fn tick(&mut self) {
        let timestamp = unix_now();

        let used_kb = self.system.memory_used_kb();
        log_flush_error(
            self.total_mem.append(Sample::new(timestamp, used_kb)),
            self.total_mem.path(),
        );

        let family_kb = self.family.family_memory_kb(&self.family_name);
        log_flush_error(
            self.family_mem.append(Sample::new(timestamp, family_kb)),
            self.family_mem.path(),
        );

        let utilization = self.system.cpu_utilization();
        log_flush_error(
            self.cpu.append(Sample::new(timestamp, utilization)),
            self.cpu.path(),
        );

        debug!(
            "tick: used={}kB family={}kB cpu={}",
            used_kb, family_kb, utilization
        );
    }

    /// Flushes every stream's buffer regardless of fill level, in reader
    /// order. Individual failures are logged and do not stop the rest.
    pub fn flush_all(&mut self) {
        log_flush_error(self.total_mem.flush(), self.total_mem.path());
        log_flush_error(self.family_mem.flush(), self.family_mem.path());
        log_flush_error(self.cpu.flush(), self.cpu.path());
    }

    /// Runs the loop until `running` is cleared, then flushes all buffers
    /// and returns.
    ///
    /// Tick spacing is wall-clock accurate: the sleep is the interval minus
    /// the tick's own processing time, saturating at zero so an overlong
    /// tick rolls straight into the next one instead of passing a negative
    /// duration to the sleep primitive. The sleep itself is sliced so a
    /// shutdown signal interrupts it within [`SLEEP_SLICE`].
    pub fn run(&mut self, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();
            self.tick();

            let mut remaining = self.interval.saturating_sub(tick_start.elapsed());
            while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
                let sleep_time = remaining.min(SLEEP_SLICE);
                std::thread::sleep(sleep_time);
                remaining = remaining.saturating_sub(sleep_time);
            }
        }

        let (total, family, cpu) = self.pending();
        info!(
            "flushing {} buffered samples before exit",
            total + family + cpu
        );
        self.flush_all();
    }

    /// Unflushed sample counts per stream (total memory, family memory,
    /// CPU), for shutdown logging.
    pub fn pending(&self) -> (usize, usize, usize) {
        (self.total_mem.len(), self.family_mem.len(), self.cpu.len())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn log_flush_error(result: std::io::Result<()>, path: &Path) {
    if let Err(e) = result {
        warn!("failed to flush samples to {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::collector::procfs::{CPU_NO_DATA, PROC_TABLE_UNAVAILABLE};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, capacity: usize) -> SamplerConfig {
        SamplerConfig {
            interval: Duration::from_millis(10),
            capacity,
            family_name: "python".to_string(),
            output_dir: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn test_tick_appends_one_sample_per_stream() {
        let dir = TempDir::new().unwrap();
        let mut sampler = Sampler::new(
            MockFs::typical_system(),
            "/proc",
            test_config(&dir, 4096),
        );

        sampler.tick();
        assert_eq!(sampler.pending(), (1, 1, 1));

        // typical_system: 16384000 - (8192000 + 512000 + 2048000).
        assert_eq!(sampler.total_mem.samples()[0].value, 5632000);
        // One python3 process with 25000 resident pages at 4 KB.
        assert_eq!(sampler.family_mem.samples()[0].value, 100000);
        // First CPU poll has no previous counters.
        assert_eq!(sampler.cpu.samples()[0].value, CPU_NO_DATA);

        sampler.tick();
        assert_eq!(sampler.pending(), (2, 2, 2));
    }

    #[test]
    fn test_tick_samples_share_timestamp() {
        let dir = TempDir::new().unwrap();
        let mut sampler = Sampler::new(
            MockFs::typical_system(),
            "/proc",
            test_config(&dir, 4096),
        );
        sampler.tick();
        let ts = sampler.total_mem.samples()[0].timestamp;
        assert_eq!(sampler.family_mem.samples()[0].timestamp, ts);
        assert_eq!(sampler.cpu.samples()[0].timestamp, ts);
    }

    #[test]
    fn test_tick_survives_empty_proc() {
        let dir = TempDir::new().unwrap();
        let mut sampler = Sampler::new(MockFs::new(), "/proc", test_config(&dir, 4096));

        sampler.tick();
        assert_eq!(sampler.total_mem.samples()[0].value, 0);
        assert_eq!(
            sampler.family_mem.samples()[0].value,
            PROC_TABLE_UNAVAILABLE
        );
        assert_eq!(
            sampler.cpu.samples()[0].value,
            crate::collector::procfs::CPU_READ_ERROR
        );
    }

    #[test]
    fn test_flush_all_writes_partial_buffers() {
        let dir = TempDir::new().unwrap();
        let mut sampler = Sampler::new(
            MockFs::typical_system(),
            "/proc",
            test_config(&dir, 4096),
        );

        sampler.tick();
        sampler.tick();
        sampler.flush_all();

        assert_eq!(sampler.pending(), (0, 0, 0));
        for filename in [TOTAL_MEM_FILENAME, FAMILY_MEM_FILENAME, CPU_FILENAME] {
            let content = std::fs::read_to_string(dir.path().join(filename)).unwrap();
            assert_eq!(content.lines().count(), 2, "{}", filename);
        }
    }

    #[test]
    fn test_capacity_flush_during_ticks() {
        let dir = TempDir::new().unwrap();
        let mut sampler = Sampler::new(
            MockFs::typical_system(),
            "/proc",
            test_config(&dir, 2),
        );

        sampler.tick();
        assert!(!dir.path().join(TOTAL_MEM_FILENAME).exists());
        sampler.tick();

        // Second tick filled every buffer to capacity.
        assert_eq!(sampler.pending(), (0, 0, 0));
        let content = std::fs::read_to_string(dir.path().join(TOTAL_MEM_FILENAME)).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_run_flushes_on_cancellation() {
        let dir = TempDir::new().unwrap();
        let mut sampler = Sampler::new(
            MockFs::typical_system(),
            "/proc",
            test_config(&dir, 4096),
        );

        let running = Arc::new(AtomicBool::new(true));
        let stopper = running.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            stopper.store(false, Ordering::SeqCst);
        });

        sampler.run(&running);
        handle.join().unwrap();

        // At least one tick ran and everything was flushed on the way out.
        assert_eq!(sampler.pending(), (0, 0, 0));
        for filename in [TOTAL_MEM_FILENAME, FAMILY_MEM_FILENAME, CPU_FILENAME] {
            let path = dir.path().join(filename);
            assert!(path.exists(), "{}", filename);
            assert!(!std::fs::read_to_string(&path).unwrap().is_empty());
        }
    }

    #[test]
    fn test_run_with_zero_interval_does_not_stall() {
        // An elapsed time exceeding the interval must clamp the sleep to
        // zero, not error or block.
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir, 4096);
        config.interval = Duration::ZERO;
        let mut sampler = Sampler::new(MockFs::typical_system(), "/proc", config);

        let running = Arc::new(AtomicBool::new(true));
        let stopper = running.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            stopper.store(false, Ordering::SeqCst);
        });

        sampler.run(&running);
        handle.join().unwrap();
        assert_eq!(sampler.pending(), (0, 0, 0));
    }
}
