//! Metric collectors for the host telemetry sampler.
//!
//! Collectors read from the `/proc` filesystem through the [`FileSystem`]
//! trait, so tests can substitute an in-memory [`MockFs`] for the real
//! thing.
//!
//! # Usage
//!
//! ```ignore
//! use hoststat::collector::{RealFs, SystemCollector};
//!
//! let mut collector = SystemCollector::new(RealFs::new(), "/proc");
//! let used_kb = collector.memory_used_kb();
//! ```

pub mod mock;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{
    CPU_NO_DATA, CPU_READ_ERROR, PROC_TABLE_UNAVAILABLE, ProcessFamilyCollector, SystemCollector,
};
pub use traits::{FileSystem, RealFs};
