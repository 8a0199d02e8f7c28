//! hoststatd - host telemetry sampler daemon.
//!
//! Samples system memory, process-family memory, and CPU utilization from
//! /proc once per interval, and flushes the buffered samples to flat text
//! files when a buffer fills or on Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use hoststat::collector::RealFs;
use hoststat::sampler::{Sampler, SamplerConfig};

/// Host telemetry sampler daemon.
#[derive(Parser)]
#[command(name = "hoststatd", about = "Host telemetry sampler daemon", version)]
struct Args {
    /// Sampling interval in seconds.
    #[arg(short, long, default_value = "1")]
    interval: u64,

    /// Directory for the per-metric output files.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Command-name fragment selecting the process family to account.
    #[arg(short, long, default_value = "tensorflow")]
    name: String,

    /// Samples buffered per metric stream before an automatic flush.
    #[arg(long, default_value = "4096")]
    capacity: usize,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("hoststatd={}", level).parse().unwrap())
        .add_directive(format!("hoststat={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("hoststatd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}s, output={}, proc={}, family=\"{}\", capacity={}",
        args.interval,
        args.output_dir.display(),
        args.proc_path,
        args.name,
        args.capacity
    );

    let config = SamplerConfig {
        interval: Duration::from_secs(args.interval),
        capacity: args.capacity,
        family_name: args.name,
        output_dir: args.output_dir,
    };
    let mut sampler = Sampler::new(RealFs::new(), &args.proc_path, config);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting sampling loop");
    sampler.run(&running);

    info!("Shutdown complete");
}
