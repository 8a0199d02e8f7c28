//! Sample persistence: bounded per-stream buffers flushed to flat text
//! files.

pub mod buffer;

pub use buffer::{Sample, SampleBuffer};
