//! Control state
//!
//! The handful of interactive parameters the operator can change while the
//! dashboard runs: refresh delay, how many threads and stack frames the
//! detail view shows, the PID being typed in the overview, and a one-line
//! footer annotation. The render loop owns the single instance and hands
//! it to the transition engine for every key it drains.

use std::time::Duration;

/// Default delay when starting in the overview.
pub const DELAY_OVERVIEW: f64 = 5.5;
/// Default delay for the detail view, also applied when switching into it.
pub const DELAY_DETAIL: f64 = 3.0;
/// Hard lower bound for any configured delay.
pub const DELAY_FLOOR: f64 = 0.1;
/// Interactive delay band.
pub const MIN_DELAY: f64 = 1.0;
pub const MAX_DELAY: f64 = 9.0;

/// Shared band for threads shown and stack frames shown.
pub const MIN_ELEMENTS: usize = 3;
pub const MAX_ELEMENTS: usize = 10;
pub const DEFAULT_ELEMENTS: usize = 6;

/// Linux `pid_max` tops out at 4194304.
pub const MAX_PID_DIGITS: usize = 7;

/// Threads shown and stack frames shown in the detail view. The two move in
/// lockstep: a step is applied to both or to neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementCounts {
    pub threads: usize,
    pub frames: usize,
}

impl ElementCounts {
    /// Values outside `[MIN_ELEMENTS, MAX_ELEMENTS]` are clamped into the band.
    pub fn new(threads: usize, frames: usize) -> ElementCounts {
        ElementCounts {
            threads: threads.clamp(MIN_ELEMENTS, MAX_ELEMENTS),
            frames: frames.clamp(MIN_ELEMENTS, MAX_ELEMENTS),
        }
    }

    fn increment(&mut self) -> bool {
        if self.threads < MAX_ELEMENTS && self.frames < MAX_ELEMENTS {
            self.threads += 1;
            self.frames += 1;
            true
        } else {
            false
        }
    }

    fn decrement(&mut self) -> bool {
        if self.threads > MIN_ELEMENTS && self.frames > MIN_ELEMENTS {
            self.threads -= 1;
            self.frames -= 1;
            true
        } else {
            false
        }
    }
}

impl Default for ElementCounts {
    fn default() -> Self {
        ElementCounts::new(DEFAULT_ELEMENTS, DEFAULT_ELEMENTS)
    }
}

#[derive(Debug, Clone)]
pub struct ControlState {
    delay_s: f64,
    elements: ElementCounts,
    pending: String,
    annotation: Option<String>,
    exit_requested: bool,
}

impl ControlState {
    /// A delay below `DELAY_FLOOR` is raised to it.
    pub fn new(delay_s: f64, elements: ElementCounts) -> ControlState {
        ControlState {
            delay_s: delay_s.max(DELAY_FLOOR),
            elements,
            pending: String::new(),
            annotation: None,
            exit_requested: false,
        }
    }

    pub fn delay_secs(&self) -> f64 {
        self.delay_s
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_s)
    }

    /// Replaces the delay, rejecting values below `DELAY_FLOOR`.
    pub fn set_delay(&mut self, delay_s: f64) -> bool {
        if delay_s < DELAY_FLOOR || !delay_s.is_finite() {
            return false;
        }
        self.delay_s = delay_s;
        true
    }

    /// Moves the delay by `step` seconds without leaving the interactive
    /// band. A delay already outside the band is never pushed further out.
    pub fn step_delay(&mut self, step: f64) -> bool {
        let old = self.delay_s;
        let new = if step > 0.0 {
            if old >= MAX_DELAY {
                old
            } else {
                (old + step).min(MAX_DELAY)
            }
        } else if old <= MIN_DELAY {
            old
        } else {
            (old + step).max(MIN_DELAY)
        };
        self.delay_s = new;
        new != old
    }

    /// Sets the delay to `secs` if it lies inside the interactive band.
    pub fn set_delay_in_band(&mut self, secs: f64) -> bool {
        if (MIN_DELAY..=MAX_DELAY).contains(&secs) {
            self.delay_s = secs;
            true
        } else {
            false
        }
    }

    pub fn elements(&self) -> ElementCounts {
        self.elements
    }

    pub fn more_elements(&mut self) -> bool {
        self.elements.increment()
    }

    pub fn fewer_elements(&mut self) -> bool {
        self.elements.decrement()
    }

    pub fn pending_digits(&self) -> &str {
        &self.pending
    }

    /// Appends `digit` unless the buffer already holds `max` digits.
    pub fn push_digit(&mut self, digit: u8, max: usize) -> bool {
        if digit > 9 || self.pending.len() >= max {
            return false;
        }
        self.pending.push(char::from(b'0' + digit));
        true
    }

    pub fn pop_digit(&mut self) -> Option<char> {
        self.pending.pop()
    }

    /// Returns the pending digits and leaves the buffer empty.
    pub fn take_pending(&mut self) -> String {
        std::mem::take(&mut self.pending)
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn set_annotation(&mut self, text: impl Into<String>) {
        self.annotation = Some(text.into());
    }

    pub fn clear_annotation(&mut self) {
        self.annotation = None;
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState::new(DELAY_OVERVIEW, ElementCounts::default())
    }
}
