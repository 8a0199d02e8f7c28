//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of the `/proc` files the
//! sampler depends on into structured data. They are designed to be easily
//! testable with string inputs.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// The four `/proc/meminfo` fields the used-memory computation needs,
/// all in kilobytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub total: u64,
    pub free: u64,
    pub buffers: u64,
    pub cached: u64,
}

impl MemInfo {
    /// Memory in use: total minus everything reclaimable or free.
    ///
    /// Saturates at zero so a partially parsed input can never underflow.
    pub fn used_kb(&self) -> u64 {
        self.total
            .saturating_sub(self.free + self.buffers + self.cached)
    }
}

/// Parses `/proc/meminfo` content.
///
/// A missing or malformed field stays zero; sampling degrades rather than
/// fails when the accounting source is incomplete.
pub fn parse_meminfo(content: &str) -> MemInfo {
    let mut info = MemInfo::default();

    let parse_kb = |line: &str| -> u64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.total = parse_kb(line);
        } else if line.starts_with("MemFree:") {
            info.free = parse_kb(line);
        } else if line.starts_with("Buffers:") {
            info.buffers = parse_kb(line);
        } else if line.starts_with("Cached:") && !line.starts_with("SwapCached:") {
            info.cached = parse_kb(line);
        }
    }

    info
}

/// Aggregate CPU time counters from the first `cpu` line of `/proc/stat`,
/// in jiffies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuCounters {
    /// Time spent idle, including waiting for I/O.
    pub fn idle_time(&self) -> u64 {
        self.idle + self.iowait
    }

    /// All counted CPU time. Guest time is already included in user/nice
    /// and is deliberately not added again.
    pub fn total_time(&self) -> u64 {
        self.idle_time()
            + self.user
            + self.nice
            + self.system
            + self.irq
            + self.softirq
            + self.steal
    }
}

/// Parses the aggregate `cpu` line of `/proc/stat` content.
///
/// Requires all 10 counters (user, nice, system, idle, iowait, irq, softirq,
/// steal, guest, guest_nice); a short or malformed line is a `ParseError` so
/// the caller can report a read failure distinctly from a valid measurement.
pub fn parse_cpu_counters(content: &str) -> Result<CpuCounters, ParseError> {
    let line = content
        .lines()
        .find(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|label| label == "cpu")
        })
        .ok_or_else(|| ParseError::new("no aggregate cpu line"))?;

    let fields: Vec<&str> = line.split_whitespace().skip(1).collect();
    if fields.len() < 10 {
        return Err(ParseError::new(format!(
            "cpu line has {} fields, expected 10",
            fields.len()
        )));
    }

    let parse_field = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {} counter", name)))
    };

    Ok(CpuCounters {
        user: parse_field(0, "user")?,
        nice: parse_field(1, "nice")?,
        system: parse_field(2, "system")?,
        idle: parse_field(3, "idle")?,
        iowait: parse_field(4, "iowait")?,
        irq: parse_field(5, "irq")?,
        softirq: parse_field(6, "softirq")?,
        steal: parse_field(7, "steal")?,
        guest: parse_field(8, "guest")?,
        guest_nice: parse_field(9, "guest_nice")?,
    })
}

/// Parses `/proc/[pid]/statm` content and returns the resident page count
/// (second whitespace-separated field).
pub fn parse_statm_resident(content: &str) -> Result<u64, ParseError> {
    content
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ParseError::new("statm missing resident field"))?
        .parse()
        .map_err(|_| ParseError::new("invalid resident page count"))
}
