//! In-memory mock filesystem for testing collectors without a real `/proc`.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files and directories in memory, allowing tests to simulate
/// various `/proc` states without needing actual Linux access.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();

        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }

        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.directories.insert(path.clone());

        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    /// Adds a process with its `/proc/[pid]/comm` and `/proc/[pid]/statm` files.
    ///
    /// `resident_pages` becomes the second statm field; the remaining fields
    /// are filled with plausible values.
    pub fn add_process(&mut self, pid: u32, comm: &str, resident_pages: u64) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_dir(&base);
        self.add_file(base.join("comm"), format!("{}\n", comm));
        self.add_file(
            base.join("statm"),
            format!("{} {} 300 50 0 400 0\n", resident_pages * 2, resident_pages),
        );
    }

    /// Builds a mock `/proc` with meminfo, stat, and a couple of processes.
    ///
    /// Useful as a baseline fixture for collector and sampler tests.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/proc/meminfo",
            "MemTotal:       16384000 kB\n\
             MemFree:         8192000 kB\n\
             MemAvailable:   12288000 kB\n\
             Buffers:          512000 kB\n\
             Cached:          2048000 kB\n\
             SwapCached:            0 kB\n",
        );
        fs.add_file(
            "/proc/stat",
            "cpu  10000 200 3000 80000 500 0 100 0 0 0\n\
             cpu0 5000 100 1500 40000 250 0 50 0 0 0\n\
             ctxt 123456\n",
        );
        fs.add_process(1, "systemd", 600);
        fs.add_process(4242, "python3", 25000);
        fs
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock file not found: {}", path.display()),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock directory not found: {}", path.display()),
            ));
        }

        let mut entries: Vec<PathBuf> = Vec::new();
        for candidate in self.files.keys().chain(self.directories.iter()) {
            if candidate.parent() == Some(path) && !entries.contains(candidate) {
                entries.push(candidate.clone());
            }
        }
        entries.sort();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file_creates_parents() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/123/comm", "bash\n");
        assert!(fs.exists(Path::new("/proc")));
        assert!(fs.exists(Path::new("/proc/123")));
        assert_eq!(
            fs.read_to_string(Path::new("/proc/123/comm")).unwrap(),
            "bash\n"
        );
    }

    #[test]
    fn test_read_dir_lists_children_only() {
        let mut fs = MockFs::new();
        fs.add_process(1, "init", 100);
        fs.add_process(2, "kthreadd", 0);
        let entries = fs.read_dir(Path::new("/proc")).unwrap();
        assert_eq!(
            entries,
            vec![PathBuf::from("/proc/1"), PathBuf::from("/proc/2")]
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let fs = MockFs::new();
        let err = fs.read_to_string(Path::new("/proc/meminfo")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_read_dir_missing_directory() {
        let fs = MockFs::new();
        assert!(fs.read_dir(Path::new("/proc")).is_err());
    }
}
