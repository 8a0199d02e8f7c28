//! System-wide collectors: used memory from `/proc/meminfo` and CPU
//! utilization from the aggregate counters in `/proc/stat`.

use crate::collector::procfs::parser::{parse_cpu_counters, parse_meminfo};
use crate::collector::traits::FileSystem;
use std::path::Path;
use tracing::debug;

/// Sentinel returned by [`SystemCollector::cpu_utilization`] when no
/// utilization can be computed yet: the very first poll has no previous
/// counters to delta against, and a zero-width counter interval carries no
/// measurement either.
pub const CPU_NO_DATA: f64 = -1.0;

/// Sentinel returned by [`SystemCollector::cpu_utilization`] when the CPU
/// counters source cannot be read or parsed. Distinct from [`CPU_NO_DATA`]
/// so consumers can tell "warming up" from "broken source".
pub const CPU_READ_ERROR: f64 = -2.0;

/// Previous-poll CPU counter totals for delta computation.
#[derive(Debug, Clone, Copy, Default)]
struct CpuDeltaState {
    prev_idle: u64,
    prev_total: u64,
    initialized: bool,
}

/// Collects system-wide metrics from `/proc/`.
///
/// Owns the CPU delta state, so one collector instance corresponds to one
/// utilization series.
pub struct SystemCollector<F: FileSystem> {
    fs: F,
    proc_path: String,
    cpu_state: CpuDeltaState,
}

impl<F: FileSystem> SystemCollector<F> {
    /// Creates a new system collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            cpu_state: CpuDeltaState::default(),
        }
    }

    /// Reads used system memory in kilobytes: `total - (free + buffers + cached)`.
    ///
    /// An unreadable source parses as all-zero fields, so the result degrades
    /// to zero instead of failing; the sampling loop must never abort on a
    /// bad read.
    pub fn memory_used_kb(&self) -> u64 {
        let path = format!("{}/meminfo", self.proc_path);
        let content = match self.fs.read_to_string(Path::new(&path)) {
            Ok(content) => content,
            Err(e) => {
                debug!("meminfo unavailable: {}", e);
                String::new()
            }
        };
        parse_meminfo(&content).used_kb()
    }

    /// Computes CPU utilization for the interval since the previous call,
    /// as a fraction in `[0, 1]`.
    ///
    /// Utilization is `(Δtotal - Δidle) / Δtotal` over the cumulative
    /// counters of the aggregate `cpu` line. The first successful call
    /// returns [`CPU_NO_DATA`] (there is nothing to delta against) but still
    /// stores the counters for the next poll. A read or parse failure
    /// returns [`CPU_READ_ERROR`] and leaves the stored counters untouched,
    /// so one bad poll does not corrupt the next delta.
    pub fn cpu_utilization(&mut self) -> f64 {
        let path = format!("{}/stat", self.proc_path);
        let content = match self.fs.read_to_string(Path::new(&path)) {
            Ok(content) => content,
            Err(e) => {
                debug!("cpu counters unavailable: {}", e);
                return CPU_READ_ERROR;
            }
        };

        let counters = match parse_cpu_counters(&content) {
            Ok(counters) => counters,
            Err(e) => {
                debug!("cpu counters malformed: {}", e);
                return CPU_READ_ERROR;
            }
        };

        let idle = counters.idle_time();
        let total = counters.total_time();

        let state = self.cpu_state;
        self.cpu_state = CpuDeltaState {
            prev_idle: idle,
            prev_total: total,
            initialized: true,
        };

        if !state.initialized {
            return CPU_NO_DATA;
        }

        // Counters are cumulative; a regression means the source reset.
        let delta_total = total.saturating_sub(state.prev_total);
        let delta_idle = idle.saturating_sub(state.prev_idle);
        if delta_total == 0 {
            return CPU_NO_DATA;
        }

        delta_total.saturating_sub(delta_idle) as f64 / delta_total as f64
    }
}
