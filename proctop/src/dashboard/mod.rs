//! Dashboard core
//!
//! The render loop, the control state it shares with key handling, and the
//! view abstraction it drives. Key events come in through an
//! `InputEventSource` mailbox; nothing here reads process data directly.

pub mod control;
mod input;
mod keymap;
mod render;
mod status;
mod transition;
mod view;

pub use control::{ControlState, ElementCounts};
pub use input::{mailbox, InputEventSource, Mailbox, MAILBOX_CAPACITY};
pub use keymap::{decode, Command};
pub use render::{ClearMode, Exit, LoopOptions, RenderLoop};
pub use status::{HostInfo, StatusBar, Support, VERSION};
pub use transition::{Transition, TransitionEngine};
pub use view::{ActiveView, Detail, Frame, Overview, View, ViewFactory, ViewKind};
