//! Process data
//!
//! Everything the views show is read through `ProcessSource`. `ProcFs` is
//! the Linux implementation, backed by the proc filesystem.

mod fs;
mod stat;

pub use self::fs::ProcFs;
pub use self::stat::Stat;

use crate::error::SourceError;

/// Kernel clock ticks per second (`USER_HZ`), the unit of the CPU counters.
pub const CLOCK_TICKS: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub state: char,
    pub threads: u32,
    /// User plus system time, in clock ticks.
    pub cpu_ticks: u64,
    pub rss_kb: u64,
    pub vsize_kb: u64,
    pub cmdline: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub tid: u32,
    pub name: String,
    pub state: char,
    pub cpu_ticks: u64,
}

pub trait ProcessSource {
    fn processes(&self) -> Result<Vec<ProcessInfo>, SourceError>;

    fn process(&self, pid: u32) -> Result<ProcessInfo, SourceError>;

    fn threads(&self, pid: u32) -> Result<Vec<ThreadInfo>, SourceError>;

    /// Kernel stack of one thread, innermost frame first. Empty if the
    /// stack is not readable by this user.
    fn stack(&self, pid: u32, tid: u32) -> Result<Vec<String>, SourceError>;
}
