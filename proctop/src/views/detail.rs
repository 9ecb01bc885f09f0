use std::cmp::Ordering;

use super::{cpu_column, fit, state_name, CpuMeter};
use crate::dashboard::{ControlState, Detail, Frame, View};
use crate::error::{SourceError, ViewError};
use crate::procfs::{ProcessInfo, ProcessSource, ThreadInfo};

pub const DEFAULT_NAME_WIDTH: usize = 30;

#[derive(Debug, Clone)]
pub struct DetailSettings {
    pub width: Option<usize>,
    /// When false every thread is shown, regardless of the element count.
    pub thread_limit: bool,
    pub name_width: usize,
}

impl Default for DetailSettings {
    fn default() -> Self {
        DetailSettings {
            width: None,
            thread_limit: true,
            name_width: DEFAULT_NAME_WIDTH,
        }
    }
}

/// One process: its threads, busiest first, each with the top of its
/// kernel stack.
pub struct ProcessDetail<S> {
    source: S,
    pid: u32,
    settings: DetailSettings,
    cpu: CpuMeter,
    gone: bool,
}

impl<S: ProcessSource> ProcessDetail<S> {
    pub fn new(source: S, pid: u32, settings: DetailSettings) -> Self {
        ProcessDetail {
            source,
            pid,
            settings,
            cpu: CpuMeter::default(),
            gone: false,
        }
    }

    fn sample(&self) -> Result<Option<(ProcessInfo, Vec<ThreadInfo>)>, SourceError> {
        let info = match self.source.process(self.pid) {
            Ok(info) => info,
            Err(SourceError::NoSuchProcess(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        match self.source.threads(self.pid) {
            Ok(threads) => Ok(Some((info, threads))),
            Err(SourceError::NoSuchProcess(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn header(&self, frame: &mut Frame<'_>, info: &ProcessInfo) -> Result<(), ViewError> {
        let width = self.settings.width;
        frame.line(fit(
            &format!(
                " PID {}: {}  state {}  threads {}  rss {} kB  vsz {} kB",
                info.pid,
                info.name,
                state_name(info.state),
                info.threads,
                info.rss_kb,
                info.vsize_kb
            ),
            width,
        ))?;
        if !info.cmdline.is_empty() {
            frame.line(fit(&format!(" {}", info.cmdline), width))?;
        }
        Ok(())
    }
}

impl<S: ProcessSource> View for ProcessDetail<S> {
    fn render_body(
        &mut self,
        frame: &mut Frame<'_>,
        control: &ControlState,
    ) -> Result<(), ViewError> {
        let Some((info, mut threads)) = self.sample()? else {
            self.gone = true;
            frame.blank()?;
            frame.line(format_args!(" PID {} has exited.", self.pid))?;
            return Ok(());
        };

        let usage = self.cpu.update(threads.iter().map(|t| (t.tid, t.cpu_ticks)));
        threads.sort_by(|a, b| {
            let ua = usage.get(&a.tid).copied().unwrap_or(0.0);
            let ub = usage.get(&b.tid).copied().unwrap_or(0.0);
            ub.partial_cmp(&ua)
                .unwrap_or(Ordering::Equal)
                .then(a.tid.cmp(&b.tid))
        });

        frame.blank()?;
        self.header(frame, &info)?;
        frame.blank()?;

        let elements = control.elements();
        let shown = if self.settings.thread_limit {
            elements.threads.min(threads.len())
        } else {
            threads.len()
        };
        let name_width = self.settings.name_width;
        let width = self.settings.width;

        frame.line(fit(
            &format!(
                "{:>8}  {:<name_width$}  {:<9} {:>6}",
                "TID", "NAME", "STATE", "%CPU"
            ),
            width,
        ))?;
        for t in &threads[..shown] {
            let row = format!(
                "{:>8}  {:<name_width$}  {:<9} {}",
                t.tid,
                fit(&t.name, Some(name_width)),
                state_name(t.state),
                cpu_column(usage.get(&t.tid)),
            );
            frame.line(fit(&row, width))?;

            // A thread may exit between listing and reading its stack.
            let stack = self.source.stack(self.pid, t.tid).unwrap_or_default();
            for call in stack.iter().take(elements.frames) {
                frame.line(fit(&format!("            at {}", call), width))?;
            }
        }
        if shown < threads.len() {
            frame.blank()?;
            frame.line(format_args!(
                " Note: only the top {} of {} threads are shown.",
                shown,
                threads.len()
            ))?;
        }
        Ok(())
    }

    fn render_footer(
        &mut self,
        frame: &mut Frame<'_>,
        control: &ControlState,
    ) -> Result<(), ViewError> {
        let elements = control.elements();
        frame.blank()?;
        frame.line(format_args!(
            " threads {} | frames {} | refresh {:.1}s    PgUp/PgDn: fewer/more  </>: refresh  q: quit",
            elements.threads,
            elements.frames,
            control.delay_secs()
        ))?;
        Ok(())
    }

    fn should_exit(&self) -> bool {
        self.gone
    }
}

impl<S: ProcessSource> Detail for ProcessDetail<S> {
    fn pid(&self) -> u32 {
        self.pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::ElementCounts;
    use crate::views::testing::FakeSource;

    fn render(view: &mut ProcessDetail<FakeSource>, ctl: &ControlState) -> String {
        let mut buf = Vec::new();
        {
            let mut frame = Frame::new(&mut buf);
            view.render_body(&mut frame, ctl).unwrap();
            view.render_footer(&mut frame, ctl).unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    fn busy_source() -> FakeSource {
        let source = FakeSource::default();
        let threads: Vec<(u32, String, u64)> =
            (0..8).map(|i| (500 + i, format!("t{i}"), 0)).collect();
        let refs: Vec<(u32, &str, u64)> =
            threads.iter().map(|(t, n, c)| (*t, n.as_str(), *c)).collect();
        source.add(500, "db", &refs);
        source
    }

    #[test]
    fn limits_threads_and_frames() {
        let mut view = ProcessDetail::new(busy_source(), 500, DetailSettings::default());
        let ctl = ControlState::new(3.0, ElementCounts::new(3, 3));
        let text = render(&mut view, &ctl);

        assert!(text.contains(" PID 500: db"));
        assert!(text.contains("t2"));
        assert!(!text.contains("t3"));
        // Fake stacks have two frames, fewer than the limit.
        assert_eq!(text.matches("            at ").count(), 3 * 2);
        assert!(text.contains("only the top 3 of 8 threads"));
        assert!(text.contains("threads 3 | frames 3 | refresh 3.0s"));
    }

    #[test]
    fn thread_limit_can_be_disabled() {
        let settings = DetailSettings {
            thread_limit: false,
            ..DetailSettings::default()
        };
        let mut view = ProcessDetail::new(busy_source(), 500, settings);
        let text = render(&mut view, &ControlState::default());
        assert!(text.contains("t7"));
        assert!(!text.contains("only the top"));
    }

    #[test]
    fn exits_when_process_is_gone() {
        let source = busy_source();
        let mut view = ProcessDetail::new(source.clone(), 500, DetailSettings::default());
        render(&mut view, &ControlState::default());
        assert!(!view.should_exit());

        source.remove(500);
        let text = render(&mut view, &ControlState::default());
        assert!(text.contains("PID 500 has exited."));
        assert!(view.should_exit());
    }
}
