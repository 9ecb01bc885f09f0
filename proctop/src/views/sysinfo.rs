use std::env;
use std::io::{self, Write};
use std::path::Path;

use crate::dashboard::{HostInfo, StatusBar, VERSION};

/// Host diagnostics as `key=value` lines.
pub fn write_sysinfo(out: &mut impl Write, host: &HostInfo, proc_root: &Path) -> io::Result<()> {
    let mut status = StatusBar::new(host.clone()).with_loadavg_path(proc_root.join("loadavg"));

    writeln!(out, "proctop.version={}", VERSION)?;
    writeln!(out, "os.name={}", host.os)?;
    writeln!(out, "os.arch={}", host.arch)?;
    writeln!(out, "os.release={}", host.release.as_deref().unwrap_or("unknown"))?;
    writeln!(out, "host.cpus={}", host.cpus)?;
    writeln!(out, "proc.root={}", proc_root.display())?;
    writeln!(out, "proc.available={}", proc_root.join("self").exists())?;
    match status.load_average() {
        Some(load) => writeln!(out, "load.average={:.2}", load)?,
        None => writeln!(out, "load.average=unsupported")?,
    }
    if let Ok(user) = env::var("USER") {
        writeln!(out, "user.name={}", user)?;
    }
    if let Ok(dir) = env::current_dir() {
        writeln!(out, "user.dir={}", dir.display())?;
    }
    if let Ok(term) = env::var("TERM") {
        writeln!(out, "term={}", term)?;
    }
    Ok(())
}
