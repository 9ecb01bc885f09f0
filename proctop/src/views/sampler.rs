use std::io::Write;

use chrono::Local;

use super::state_name;
use crate::error::Result;
use crate::procfs::ProcessSource;

/// One-shot sampling of a single process, outside the render loop.
pub struct Sampler<S> {
    source: S,
    pid: u32,
}

impl<S: ProcessSource> Sampler<S> {
    /// Fails if `pid` does not name a live process.
    pub fn attach(source: S, pid: u32) -> Result<Self> {
        source.process(pid)?;
        Ok(Sampler { source, pid })
    }

    /// Writes every thread of the process with its kernel stack.
    pub fn thread_dump(&self, out: &mut impl Write) -> Result<()> {
        let info = self.source.process(self.pid)?;
        let threads = self.source.threads(self.pid)?;

        writeln!(
            out,
            "{} thread dump of PID {} ({}):",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            info.pid,
            info.name
        )?;
        if !info.cmdline.is_empty() {
            writeln!(out, "{}", info.cmdline)?;
        }
        writeln!(out)?;

        for t in &threads {
            writeln!(out, "\"{}\" tid={} {}", t.name, t.tid, state_name(t.state))?;
            let stack = self.source.stack(self.pid, t.tid).unwrap_or_default();
            if stack.is_empty() {
                writeln!(out, "    (stack not available)")?;
            }
            for call in &stack {
                writeln!(out, "    at {}", call)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
