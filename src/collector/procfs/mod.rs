//! Collectors for the Linux `/proc` filesystem.

pub mod parser;
pub mod process;
pub mod system;

pub use process::{PROC_TABLE_UNAVAILABLE, ProcessFamilyCollector};
pub use system::{CPU_NO_DATA, CPU_READ_ERROR, SystemCollector};
