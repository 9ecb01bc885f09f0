//! Status bar
//!
//! The first line of every frame: version, wall clock, and a short host
//! summary. The load average is shown only if the host exposes one; the
//! probe runs once and its result is cached.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::Local;
use tracing::debug;

use super::view::Frame;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub arch: &'static str,
    pub cpus: usize,
    pub os: &'static str,
    pub release: Option<String>,
}

impl HostInfo {
    pub fn detect() -> HostInfo {
        let release = fs::read_to_string("/proc/sys/kernel/osrelease")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        HostInfo {
            arch: std::env::consts::ARCH,
            cpus: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            os: std::env::consts::OS,
            release,
        }
    }

    /// OS name followed by the kernel release when known.
    pub fn os_description(&self) -> String {
        match &self.release {
            Some(r) => format!("{} {}", self.os, r),
            None => self.os.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Unknown,
    Supported,
    Unsupported,
}

pub struct StatusBar {
    host: HostInfo,
    loadavg_path: PathBuf,
    load_support: Support,
}

impl StatusBar {
    pub fn new(host: HostInfo) -> StatusBar {
        StatusBar {
            host,
            loadavg_path: PathBuf::from("/proc/loadavg"),
            load_support: Support::Unknown,
        }
    }

    pub fn with_loadavg_path(mut self, path: impl AsRef<Path>) -> StatusBar {
        self.loadavg_path = path.as_ref().to_path_buf();
        self
    }

    pub fn load_support(&self) -> Support {
        self.load_support
    }

    /// One-minute load average, or `None` if the host has none.
    pub fn load_average(&mut self) -> Option<f64> {
        if self.load_support == Support::Unsupported {
            return None;
        }
        let value = fs::read_to_string(&self.loadavg_path)
            .ok()
            .and_then(|s| s.split_whitespace().next()?.parse::<f64>().ok());
        match (value, self.load_support) {
            (Some(v), _) => {
                self.load_support = Support::Supported;
                Some(v)
            }
            (None, Support::Unknown) => {
                debug!(path = %self.loadavg_path.display(), "load average not available");
                self.load_support = Support::Unsupported;
                None
            }
            (None, _) => None,
        }
    }

    pub fn render(&mut self, frame: &mut Frame<'_>) -> io::Result<()> {
        let mut line = format!(
            " proctop {} - {}, {:>6}, {:>2} cpus, {:15.15}",
            VERSION,
            Local::now().format("%H:%M:%S"),
            self.host.arch,
            self.host.cpus,
            self.host.os_description(),
        );
        if let Some(load) = self.load_average() {
            line.push_str(&format!(", load avg {:3.2}", load));
        }
        frame.line(line)
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        StatusBar::new(HostInfo::detect())
    }
}
