//! View transitions
//!
//! Turns decoded key presses into changes of the control state and, in the
//! overview, into requests to switch to a detail view. The engine never
//! swaps views itself: it returns a `Transition` that the render loop
//! applies on its own thread.

use crossterm::event::KeyEvent;
use tracing::debug;

use super::control::{ControlState, MAX_PID_DIGITS};
use super::keymap::{self, Command};
use super::view::{ActiveView, Overview};

/// Outcome of one key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    None,
    Quit,
    /// The submitted PID is known; the overview should be replaced.
    SwitchToDetail(u32),
    /// The submitted text did not name a known PID. The footer annotation
    /// has already been set and the pending digits cleared.
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct TransitionEngine {
    max_digits: usize,
}

impl TransitionEngine {
    pub fn new(max_digits: usize) -> TransitionEngine {
        TransitionEngine {
            max_digits: max_digits.max(1),
        }
    }

    pub fn on_key(
        &self,
        key: &KeyEvent,
        control: &mut ControlState,
        active: &ActiveView,
    ) -> Transition {
        let command = keymap::decode(key);
        if command == Command::Quit {
            control.request_exit();
            return Transition::Quit;
        }

        match active {
            ActiveView::Detail(_) => {
                self.on_detail(command, control);
                Transition::None
            }
            ActiveView::Overview(overview) => self.on_overview(command, control, overview.as_ref()),
        }
    }

    fn on_detail(&self, command: Command, control: &mut ControlState) {
        let changed = match command {
            Command::MoreElements => control.more_elements(),
            Command::FewerElements => control.fewer_elements(),
            Command::SlowerRefresh => control.step_delay(1.0),
            Command::FasterRefresh => control.step_delay(-1.0),
            Command::Digit(d) => control.set_delay_in_band(f64::from(d)),
            _ => false,
        };
        if changed {
            debug!(
                ?command,
                delay = control.delay_secs(),
                threads = control.elements().threads,
                frames = control.elements().frames,
                "detail parameters changed"
            );
        }
    }

    fn on_overview(
        &self,
        command: Command,
        control: &mut ControlState,
        overview: &dyn Overview,
    ) -> Transition {
        match command {
            Command::Digit(d) => {
                if control.push_digit(d, self.max_digits) {
                    return Transition::None;
                }
                // Buffer full: submit what we have, then start over with
                // this digit. A successful swap clears it again.
                let outcome = self.submit(control, overview);
                control.push_digit(d, self.max_digits);
                outcome
            }
            Command::Submit if !control.pending_digits().is_empty() => {
                self.submit(control, overview)
            }
            Command::Erase => {
                control.pop_digit();
                Transition::None
            }
            _ => Transition::None,
        }
    }

    fn submit(&self, control: &mut ControlState, overview: &dyn Overview) -> Transition {
        let digits = control.take_pending();
        match digits.parse::<u32>() {
            Ok(pid) if overview.known_pids().contains(&pid) => {
                debug!(pid, "pid submitted");
                Transition::SwitchToDetail(pid)
            }
            Ok(pid) => {
                control.set_annotation(format!(
                    " [!] PID {} is not found. Please enter a listed PID.",
                    pid
                ));
                Transition::Rejected(digits)
            }
            Err(_) => {
                control.set_annotation(format!(" [!] '{}' is not a valid PID.", digits));
                Transition::Rejected(digits)
            }
        }
    }
}

impl Default for TransitionEngine {
    fn default() -> Self {
        TransitionEngine::new(MAX_PID_DIGITS)
    }
}
