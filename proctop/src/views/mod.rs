//! Process views
//!
//! Concrete overview and detail screens over a `ProcessSource`, plus the
//! one-shot thread dump and host diagnostics used outside the render loop.

mod detail;
mod overview;
mod sampler;
mod sysinfo;

pub use detail::{DetailSettings, ProcessDetail, DEFAULT_NAME_WIDTH};
pub use overview::ProcessOverview;
pub use sampler::Sampler;
pub use sysinfo::write_sysinfo;

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Instant;

use crate::dashboard::{Detail, ViewFactory};
use crate::error::ViewError;
use crate::procfs::{ProcessSource, CLOCK_TICKS};

/// Creates detail views for PIDs picked in the overview.
#[derive(Debug, Clone)]
pub struct ProcessViews<S> {
    source: S,
    settings: DetailSettings,
}

impl<S: ProcessSource + Clone + 'static> ProcessViews<S> {
    pub fn new(source: S, settings: DetailSettings) -> Self {
        ProcessViews { source, settings }
    }

    pub fn overview(&self, max_rows: Option<usize>) -> ProcessOverview<S> {
        ProcessOverview::new(self.source.clone(), self.settings.width, max_rows)
    }
}

impl<S: ProcessSource + Clone + 'static> ViewFactory for ProcessViews<S> {
    fn detail(&self, pid: u32) -> Result<Box<dyn Detail>, ViewError> {
        self.source.process(pid)?;
        Ok(Box::new(ProcessDetail::new(
            self.source.clone(),
            pid,
            self.settings.clone(),
        )))
    }
}

/// CPU usage from successive tick counters.
#[derive(Debug, Default)]
struct CpuMeter {
    last: HashMap<u32, u64>,
    last_at: Option<Instant>,
}

impl CpuMeter {
    /// Percent of one CPU used by each id since the previous call. Ids seen
    /// for the first time have no value.
    fn update(&mut self, samples: impl Iterator<Item = (u32, u64)>) -> HashMap<u32, f64> {
        let now = Instant::now();
        let elapsed = self.last_at.map(|t| now.duration_since(t).as_secs_f64());
        let mut usage = HashMap::new();
        let mut next = HashMap::new();

        for (id, ticks) in samples {
            if let (Some(prev), Some(secs)) = (self.last.get(&id), elapsed) {
                if secs > 0.0 {
                    let delta = ticks.saturating_sub(*prev) as f64;
                    usage.insert(id, 100.0 * delta / CLOCK_TICKS / secs);
                }
            }
            next.insert(id, ticks);
        }

        self.last = next;
        self.last_at = Some(now);
        usage
    }
}

fn cpu_column(usage: Option<&f64>) -> String {
    match usage {
        Some(pct) => format!("{:6.1}", pct),
        None => format!("{:>6}", "-"),
    }
}

/// Cuts `text` to `width` characters.
fn fit(text: &str, width: Option<usize>) -> Cow<'_, str> {
    match width {
        Some(w) if text.chars().count() > w => Cow::Owned(text.chars().take(w).collect()),
        _ => Cow::Borrowed(text),
    }
}

fn state_name(state: char) -> &'static str {
    match state {
        'R' => "RUNNABLE",
        'S' => "SLEEPING",
        'D' => "WAITING",
        'Z' => "ZOMBIE",
        'T' => "STOPPED",
        't' => "TRACED",
        'I' => "IDLE",
        'X' | 'x' => "DEAD",
        _ => "UNKNOWN",
    }
}
