use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::stat::Stat;
use super::{ProcessInfo, ProcessSource, ThreadInfo};
use crate::error::SourceError;

/// Reads process data from a proc filesystem mounted at `root`.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    pub fn new() -> ProcFs {
        ProcFs::with_root("/proc")
    }

    pub fn with_root(root: impl AsRef<Path>) -> ProcFs {
        ProcFs {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `comm` is arbitrary bytes, so the line is decoded lossily.
    fn read_stat(&self, path: PathBuf, id: u32) -> Result<Stat, SourceError> {
        let raw = fs::read(&path).map_err(|e| not_found_as(e, id))?;
        let text = String::from_utf8_lossy(&raw);
        Stat::parse(text.trim_end()).map_err(|reason| SourceError::Parse { file: path, reason })
    }

    /// `VmRSS` from the status file, in kB. Kernel threads have none.
    fn rss_kb(&self, pid: u32) -> u64 {
        let path = self.root.join(pid.to_string()).join("status");
        let Ok(text) = fs::read_to_string(path) else {
            return 0;
        };
        text.lines()
            .find_map(|l| l.strip_prefix("VmRSS:"))
            .and_then(|v| v.split_whitespace().next()?.parse().ok())
            .unwrap_or(0)
    }

    fn cmdline(&self, pid: u32) -> String {
        let path = self.root.join(pid.to_string()).join("cmdline");
        match fs::read(path) {
            Ok(raw) => raw
                .split(|b| *b == 0)
                .filter(|arg| !arg.is_empty())
                .map(|arg| String::from_utf8_lossy(arg))
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => String::new(),
        }
    }

    fn numeric_entries(&self, dir: &Path) -> io::Result<Vec<u32>> {
        let mut ids: Vec<u32> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse().ok())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        ProcFs::new()
    }
}

impl ProcessSource for ProcFs {
    fn processes(&self) -> Result<Vec<ProcessInfo>, SourceError> {
        let pids = self.numeric_entries(&self.root).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::Unavailable(self.root.clone()),
            _ => SourceError::Io(e),
        })?;

        let mut out = Vec::with_capacity(pids.len());
        for pid in pids {
            match self.process(pid) {
                Ok(info) => out.push(info),
                Err(SourceError::Unavailable(path)) => return Err(SourceError::Unavailable(path)),
                // Exited between listing and reading, or unreadable.
                Err(e) => trace!(pid, "skipping process: {e}"),
            }
        }
        Ok(out)
    }

    fn process(&self, pid: u32) -> Result<ProcessInfo, SourceError> {
        let stat = self.read_stat(self.root.join(pid.to_string()).join("stat"), pid)?;
        Ok(ProcessInfo {
            pid,
            name: stat.comm.clone(),
            state: stat.state,
            threads: stat.num_threads,
            cpu_ticks: stat.cpu_ticks(),
            rss_kb: self.rss_kb(pid),
            vsize_kb: stat.vsize / 1024,
            cmdline: self.cmdline(pid),
        })
    }

    fn threads(&self, pid: u32) -> Result<Vec<ThreadInfo>, SourceError> {
        let task_dir = self.root.join(pid.to_string()).join("task");
        let tids = self
            .numeric_entries(&task_dir)
            .map_err(|e| not_found_as(e, pid))?;

        let mut out = Vec::with_capacity(tids.len());
        for tid in tids {
            match self.read_stat(task_dir.join(tid.to_string()).join("stat"), tid) {
                Ok(stat) => out.push(ThreadInfo {
                    tid,
                    cpu_ticks: stat.cpu_ticks(),
                    name: stat.comm,
                    state: stat.state,
                }),
                Err(SourceError::Unavailable(path)) => return Err(SourceError::Unavailable(path)),
                Err(e) => trace!(pid, tid, "skipping thread: {e}"),
            }
        }
        Ok(out)
    }

    fn stack(&self, pid: u32, tid: u32) -> Result<Vec<String>, SourceError> {
        let path = self
            .root
            .join(pid.to_string())
            .join("task")
            .join(tid.to_string())
            .join("stack");
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return Ok(Vec::new()),
            Err(e) => return Err(not_found_as(e, tid)),
        };
        Ok(text.lines().filter_map(stack_frame).collect())
    }
}

/// `[<0>] do_wait+0x1d8/0x2c0` -> `do_wait+0x1d8/0x2c0`
fn stack_frame(line: &str) -> Option<String> {
    let frame = match line.find("] ") {
        Some(i) if line.starts_with('[') => &line[i + 2..],
        _ => line,
    };
    let frame = frame.trim();
    (!frame.is_empty()).then(|| frame.to_string())
}

fn not_found_as(e: io::Error, id: u32) -> SourceError {
    match e.kind() {
        io::ErrorKind::NotFound => SourceError::NoSuchProcess(id),
        _ => SourceError::Io(e),
    }
}
