//! hoststat — lightweight host telemetry sampler.
//!
//! Periodically measures system-wide used memory, the resident memory of a
//! named process family, and CPU utilization from `/proc`, buffering
//! timestamped samples in memory and flushing each stream to its own flat
//! text file when the buffer fills or the daemon is interrupted.
//!
//! - `collector` — `/proc` readers behind a mockable filesystem trait
//! - `storage` — bounded sample buffers with flush-to-file persistence
//! - `sampler` — the tick loop tying readers and buffers together

pub mod collector;
pub mod sampler;
pub mod storage;
