//! Views
//!
//! A view draws one screen of the dashboard. Exactly one is active at a
//! time: either an `Overview` listing every process, or a `Detail` for a
//! single PID. Render parameters come from the `ControlState` passed in on
//! every call, views never cache them.

use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};

use super::control::ControlState;
use crate::error::ViewError;

/// Line-oriented output for one frame. Lines end in `\r\n` so that output
/// stays aligned while the terminal is in raw mode.
pub struct Frame<'a> {
    out: &'a mut dyn Write,
}

impl<'a> Frame<'a> {
    pub fn new(out: &'a mut dyn Write) -> Frame<'a> {
        Frame { out }
    }

    pub fn line(&mut self, text: impl fmt::Display) -> io::Result<()> {
        write!(self.out, "{}\r\n", text)
    }

    pub fn blank(&mut self) -> io::Result<()> {
        self.out.write_all(b"\r\n")
    }
}

/// The capability set the render loop needs from any view.
pub trait View {
    fn render_body(&mut self, frame: &mut Frame<'_>, control: &ControlState)
        -> Result<(), ViewError>;

    fn render_footer(
        &mut self,
        frame: &mut Frame<'_>,
        control: &ControlState,
    ) -> Result<(), ViewError>;

    /// Checked before every frame; `true` ends the run.
    fn should_exit(&self) -> bool {
        false
    }
}

pub trait Overview: View {
    /// PIDs seen by the most recent render.
    fn known_pids(&self) -> &BTreeSet<u32>;

    /// Called once, right before the view is replaced.
    fn dismiss(&mut self) {}
}

pub trait Detail: View {
    fn pid(&self) -> u32;
}

/// Builds a detail view when the operator picks a PID from the overview.
pub trait ViewFactory {
    fn detail(&self, pid: u32) -> Result<Box<dyn Detail>, ViewError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Overview,
    Detail,
}

pub enum ActiveView {
    Overview(Box<dyn Overview>),
    Detail(Box<dyn Detail>),
}

impl ActiveView {
    pub fn kind(&self) -> ViewKind {
        match self {
            ActiveView::Overview(_) => ViewKind::Overview,
            ActiveView::Detail(_) => ViewKind::Detail,
        }
    }

    /// The detail view's target, `None` in the overview.
    pub fn pid(&self) -> Option<u32> {
        match self {
            ActiveView::Overview(_) => None,
            ActiveView::Detail(v) => Some(v.pid()),
        }
    }

    pub fn render_body(
        &mut self,
        frame: &mut Frame<'_>,
        control: &ControlState,
    ) -> Result<(), ViewError> {
        match self {
            ActiveView::Overview(v) => v.render_body(frame, control),
            ActiveView::Detail(v) => v.render_body(frame, control),
        }
    }

    pub fn render_footer(
        &mut self,
        frame: &mut Frame<'_>,
        control: &ControlState,
    ) -> Result<(), ViewError> {
        match self {
            ActiveView::Overview(v) => v.render_footer(frame, control),
            ActiveView::Detail(v) => v.render_footer(frame, control),
        }
    }

    pub fn should_exit(&self) -> bool {
        match self {
            ActiveView::Overview(v) => v.should_exit(),
            ActiveView::Detail(v) => v.should_exit(),
        }
    }
}

impl fmt::Debug for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveView::Overview(_) => f.write_str("Overview"),
            ActiveView::Detail(v) => write!(f, "Detail({})", v.pid()),
        }
    }
}
