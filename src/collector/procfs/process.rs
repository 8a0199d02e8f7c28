//! Resident-memory accounting for a family of processes matched by name.

use crate::collector::procfs::parser::parse_statm_resident;
use crate::collector::traits::FileSystem;
use std::path::Path;
use tracing::debug;

/// Sentinel returned by [`ProcessFamilyCollector::family_memory_kb`] when
/// the process table itself cannot be enumerated. Distinct from 0, which
/// legitimately means "no matching processes right now".
pub const PROC_TABLE_UNAVAILABLE: i64 = -1;

/// Page size in kilobytes used to convert statm resident page counts.
const PAGE_SIZE_KB: i64 = 4;

/// Sums resident memory across all processes whose command name contains a
/// given fragment.
pub struct ProcessFamilyCollector<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> ProcessFamilyCollector<F> {
    /// Creates a new process-family collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Total resident memory, in kilobytes, of every process whose
    /// `/proc/[pid]/comm` contains `fragment`.
    ///
    /// Returns [`PROC_TABLE_UNAVAILABLE`] if the process table cannot be
    /// opened. Processes that disappear between enumeration and read are
    /// skipped silently; an exit mid-scan is expected, and the resulting
    /// under-count is tolerated rather than synchronized against.
    pub fn family_memory_kb(&self, fragment: &str) -> i64 {
        let entries = match self.fs.read_dir(Path::new(&self.proc_path)) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("process table unavailable: {}", e);
                return PROC_TABLE_UNAVAILABLE;
            }
        };

        let mut total_kb: i64 = 0;

        for entry in entries {
            // Only numeric-named entries are PID directories.
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.parse::<u32>().is_err() {
                continue;
            }

            let Ok(comm) = self.fs.read_to_string(&entry.join("comm")) else {
                continue;
            };
            if !comm.contains(fragment) {
                continue;
            }

            let Ok(statm) = self.fs.read_to_string(&entry.join("statm")) else {
                continue;
            };
            if let Ok(pages) = parse_statm_resident(&statm) {
                total_kb += pages as i64 * PAGE_SIZE_KB;
            }
        }

        total_kb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use std::path::PathBuf;

    #[test]
    fn test_no_matching_processes_is_zero() {
        let mut fs = MockFs::new();
        fs.add_process(1, "systemd", 500);
        fs.add_process(77, "bash", 300);
        let collector = ProcessFamilyCollector::new(fs, "/proc");
        assert_eq!(collector.family_memory_kb("tensorflow"), 0);
    }

    #[test]
    fn test_matching_processes_sum_resident_pages() {
        let mut fs = MockFs::new();
        fs.add_process(100, "tensorflow_serv", 10);
        fs.add_process(200, "tensorflow_work", 20);
        fs.add_process(300, "bash", 9999);
        let collector = ProcessFamilyCollector::new(fs, "/proc");
        // (10 + 20) pages at 4 KB pages.
        assert_eq!(collector.family_memory_kb("tensorflow"), 120);
    }

    #[test]
    fn test_substring_match_on_comm() {
        let mut fs = MockFs::new();
        fs.add_process(5, "my_tensorflow_fork", 7);
        let collector = ProcessFamilyCollector::new(fs, "/proc");
        assert_eq!(collector.family_memory_kb("tensorflow"), 28);
    }

    #[test]
    fn test_unreadable_proc_table_is_sentinel() {
        let collector = ProcessFamilyCollector::new(MockFs::new(), "/proc");
        assert_eq!(
            collector.family_memory_kb("tensorflow"),
            PROC_TABLE_UNAVAILABLE
        );
    }

    #[test]
    fn test_vanished_process_is_skipped() {
        let mut fs = MockFs::new();
        fs.add_process(100, "tensorflow_serv", 10);
        // Directory exists but comm/statm are gone: process exited mid-scan.
        fs.add_dir("/proc/200");
        let collector = ProcessFamilyCollector::new(fs, "/proc");
        assert_eq!(collector.family_memory_kb("tensorflow"), 40);
    }

    #[test]
    fn test_non_numeric_entries_are_ignored() {
        let mut fs = MockFs::new();
        fs.add_process(100, "tensorflow_serv", 10);
        fs.add_file("/proc/meminfo", "MemTotal: 1 kB\n");
        fs.add_dir(PathBuf::from("/proc/sys"));
        let collector = ProcessFamilyCollector::new(fs, "/proc");
        assert_eq!(collector.family_memory_kb("tensorflow"), 40);
    }
}
