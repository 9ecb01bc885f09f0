//! Render loop
//!
//! Redraws the active view on a fixed cadence. Each iteration drains the
//! input mailbox, clears the screen, prints the status bar, the view body
//! and footer, then waits for the current delay. While waiting, key events
//! are still applied as they arrive: a quit ends the run at once and a view
//! switch cuts the wait short so the new view shows up immediately.
//!
//! All view swaps happen on the thread running the loop.

use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::RecvTimeoutError;
use crossterm::event::KeyEvent;
use crossterm::{cursor, terminal, QueueableCommand};
use tracing::{debug, error, info, warn};

use super::control::{ControlState, DELAY_DETAIL};
use super::input::Mailbox;
use super::status::StatusBar;
use super::transition::{Transition, TransitionEngine};
use super::view::{ActiveView, Frame, ViewFactory};
use crate::error::ViewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// Erase the screen and home the cursor.
    Ansi,
    /// Emit a form feed, for terminals that scroll instead.
    FormFeed,
}

#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Number of frames to render before stopping. `None` and `Some(0)`
    /// both mean no limit.
    pub max_iterations: Option<u64>,
    pub clear: ClearMode,
    /// Delay applied when switching into a detail view. `None` keeps the
    /// current delay.
    pub detail_delay: Option<f64>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        LoopOptions {
            max_iterations: None,
            clear: ClearMode::Ansi,
            detail_delay: Some(DELAY_DETAIL),
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    IterationsExhausted,
    ViewExited,
    /// Required runtime facilities are missing; a diagnostic was printed.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Swapped,
    Quit,
}

pub struct RenderLoop<W: Write, F: ViewFactory> {
    out: W,
    control: ControlState,
    engine: TransitionEngine,
    factory: F,
    mailbox: Option<Mailbox>,
    status: StatusBar,
    options: LoopOptions,
}

impl<W: Write, F: ViewFactory> RenderLoop<W, F> {
    pub fn new(out: W, control: ControlState, factory: F, options: LoopOptions) -> Self {
        RenderLoop {
            out,
            control,
            engine: TransitionEngine::default(),
            factory,
            mailbox: None,
            status: StatusBar::default(),
            options,
        }
    }

    /// Without a mailbox the loop runs non-interactively.
    pub fn with_mailbox(mut self, mailbox: Mailbox) -> Self {
        self.mailbox = Some(mailbox);
        self
    }

    pub fn with_status_bar(mut self, status: StatusBar) -> Self {
        self.status = status;
        self
    }

    pub fn with_engine(mut self, engine: TransitionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn control(&self) -> &ControlState {
        &self.control
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs until quit, the view asks to exit, or the iteration budget is
    /// spent. Only terminal write failures are returned as errors.
    pub fn run(&mut self, initial: ActiveView) -> io::Result<Exit> {
        let mut view = initial;
        let mut iterations: u64 = 0;
        let budget = self.options.max_iterations.filter(|&max| max > 0);
        info!(?view, delay = self.control.delay_secs(), "dashboard started");

        loop {
            if self.drain(&mut view) == Flow::Quit || self.control.exit_requested() {
                return self.quit();
            }
            if view.should_exit() {
                info!(?view, "view finished");
                return Ok(Exit::ViewExited);
            }

            if budget != Some(1) {
                self.clear()?;
            }
            self.status.render(&mut Frame::new(&mut self.out))?;
            match self.render_view(&mut view) {
                Ok(()) => {}
                Err(ViewError::Io(e)) => return Err(e),
                Err(ViewError::Unavailable(what)) => {
                    self.out.flush()?;
                    let _ = report_missing_runtime(&mut io::stderr().lock(), &what);
                    return Ok(Exit::Fatal);
                }
                Err(e) => {
                    warn!("render failed: {e}");
                    Frame::new(&mut self.out).line(format_args!(" [!] {}", e))?;
                }
            }
            self.out.flush()?;

            iterations += 1;
            if let Some(max) = budget {
                if iterations >= max {
                    return Ok(Exit::IterationsExhausted);
                }
            }

            // The second frame follows the first immediately so that rate
            // columns have a baseline.
            if iterations > 1 && self.wait(&mut view, self.control.delay()) == Flow::Quit {
                return self.quit();
            }
        }
    }

    fn render_view(&mut self, view: &mut ActiveView) -> Result<(), ViewError> {
        let mut frame = Frame::new(&mut self.out);
        view.render_body(&mut frame, &self.control)?;
        view.render_footer(&mut frame, &self.control)
    }

    fn clear(&mut self) -> io::Result<()> {
        match self.options.clear {
            ClearMode::Ansi => {
                self.out
                    .queue(terminal::Clear(terminal::ClearType::All))?
                    .queue(cursor::MoveTo(0, 0))?;
            }
            ClearMode::FormFeed => self.out.write_all(b"\x0c")?,
        }
        Ok(())
    }

    fn quit(&mut self) -> io::Result<Exit> {
        self.out
            .queue(terminal::Clear(terminal::ClearType::CurrentLine))?
            .queue(cursor::MoveToColumn(0))?;
        self.out.flush()?;
        info!("quit requested");
        Ok(Exit::Quit)
    }

    fn drain(&mut self, view: &mut ActiveView) -> Flow {
        let Some(mailbox) = self.mailbox.clone() else {
            return Flow::Continue;
        };
        for key in mailbox.drain() {
            if self.handle_key(&key, view) == Flow::Quit {
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    fn wait(&mut self, view: &mut ActiveView, delay: Duration) -> Flow {
        let deadline = Instant::now() + delay;
        let Some(mailbox) = self.mailbox.clone() else {
            thread::sleep(delay);
            return Flow::Continue;
        };

        loop {
            match mailbox.recv_deadline(deadline) {
                Ok(key) => match self.handle_key(&key, view) {
                    Flow::Continue => continue,
                    flow => return flow,
                },
                Err(RecvTimeoutError::Timeout) => return Flow::Continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("input source went away");
                    self.mailbox = None;
                    thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    return Flow::Continue;
                }
            }
        }
    }

    fn handle_key(&mut self, key: &KeyEvent, view: &mut ActiveView) -> Flow {
        match self.engine.on_key(key, &mut self.control, view) {
            Transition::None => Flow::Continue,
            Transition::Quit => Flow::Quit,
            Transition::Rejected(input) => {
                debug!(%input, "pid rejected");
                Flow::Continue
            }
            Transition::SwitchToDetail(pid) => self.switch_to_detail(pid, view),
        }
    }

    fn switch_to_detail(&mut self, pid: u32, view: &mut ActiveView) -> Flow {
        let detail = match self.factory.detail(pid) {
            Ok(detail) => detail,
            Err(e) => {
                warn!(pid, "cannot open detail view: {e}");
                self.control
                    .set_annotation(format!(" [!] PID {} could not be opened: {}", pid, e));
                return Flow::Continue;
            }
        };

        if let ActiveView::Overview(overview) = view {
            overview.dismiss();
        }
        *view = ActiveView::Detail(detail);
        self.control.clear_pending();
        self.control.clear_annotation();
        if let Some(delay) = self.options.detail_delay {
            self.control.set_delay(delay);
        }
        info!(pid, "switched to detail view");
        Flow::Swapped
    }
}

/// Raw mode may still be on while this prints, so lines end in `\r\n`.
fn report_missing_runtime(out: &mut impl Write, what: &str) -> io::Result<()> {
    error!("required runtime components not found: {what}");
    write!(out, "\r\n")?;
    write!(
        out,
        "ERROR: Required runtime components not found ({}).\r\n",
        what
    )?;
    write!(
        out,
        "       Please check that the proc filesystem is mounted.\r\n"
    )?;
    write!(out, "\r\n")?;
    out.flush()
}
