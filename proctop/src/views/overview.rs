use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::{cpu_column, fit, CpuMeter};
use crate::dashboard::{ControlState, Frame, Overview, View};
use crate::error::ViewError;
use crate::procfs::ProcessSource;

/// Every process on the host, busiest first.
pub struct ProcessOverview<S> {
    source: S,
    width: Option<usize>,
    max_rows: Option<usize>,
    known: BTreeSet<u32>,
    cpu: CpuMeter,
}

impl<S: ProcessSource> ProcessOverview<S> {
    pub fn new(source: S, width: Option<usize>, max_rows: Option<usize>) -> Self {
        ProcessOverview {
            source,
            width,
            max_rows,
            known: BTreeSet::new(),
            cpu: CpuMeter::default(),
        }
    }
}

impl<S: ProcessSource> View for ProcessOverview<S> {
    fn render_body(&mut self, frame: &mut Frame<'_>, _: &ControlState) -> Result<(), ViewError> {
        let mut procs = self.source.processes()?;
        let usage = self.cpu.update(procs.iter().map(|p| (p.pid, p.cpu_ticks)));
        self.known = procs.iter().map(|p| p.pid).collect();

        procs.sort_by(|a, b| {
            let ua = usage.get(&a.pid).copied().unwrap_or(0.0);
            let ub = usage.get(&b.pid).copied().unwrap_or(0.0);
            ub.partial_cmp(&ua)
                .unwrap_or(Ordering::Equal)
                .then(a.pid.cmp(&b.pid))
        });

        frame.blank()?;
        let header = format!(
            "{:>8} {:<20} {} {:>5} {:>10} {:>6}  {}",
            "PID", "NAME", "S", "THR", "RSS(kB)", "%CPU", "COMMAND"
        );
        frame.line(fit(&header, self.width))?;

        let rows = self.max_rows.unwrap_or(usize::MAX);
        for p in procs.iter().take(rows) {
            let row = format!(
                "{:>8} {:<20} {} {:>5} {:>10} {}  {}",
                p.pid,
                fit(&p.name, Some(20)),
                p.state,
                p.threads,
                p.rss_kb,
                cpu_column(usage.get(&p.pid)),
                p.cmdline,
            );
            frame.line(fit(&row, self.width))?;
        }
        if procs.len() > rows {
            frame.line(format_args!(
                " ... {} more processes not shown",
                procs.len() - rows
            ))?;
        }
        Ok(())
    }

    fn render_footer(
        &mut self,
        frame: &mut Frame<'_>,
        control: &ControlState,
    ) -> Result<(), ViewError> {
        frame.blank()?;
        if let Some(note) = control.annotation() {
            frame.line(note)?;
        }
        frame.line(format_args!(
            " Enter a PID to inspect: {}_    (q to quit)",
            control.pending_digits()
        ))?;
        Ok(())
    }
}

impl<S: ProcessSource> Overview for ProcessOverview<S> {
    fn known_pids(&self) -> &BTreeSet<u32> {
        &self.known
    }
}
