//! Keyboard input
//!
//! `InputEventSource` reads terminal key events on a dedicated thread and
//! posts them into a bounded `crossbeam::channel`, the mailbox. The render
//! loop is the only reader of the mailbox.
//!
//! Note: registering the source puts the terminal in raw mode, dropping it
//! restores cooked mode.

use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel;
use crossterm::event::{self, Event, KeyEvent};
use crossterm::terminal;
use tracing::{debug, trace, warn};

pub const MAILBOX_CAPACITY: usize = 64;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Receiving end of the key event channel.
#[derive(Clone)]
pub struct Mailbox {
    rx: channel::Receiver<KeyEvent>,
}

impl Mailbox {
    pub fn new(rx: channel::Receiver<KeyEvent>) -> Mailbox {
        Mailbox { rx }
    }

    /// Key events posted so far, without blocking.
    pub fn drain(&self) -> channel::TryIter<'_, KeyEvent> {
        self.rx.try_iter()
    }

    /// Waits for the next key event until `deadline`.
    pub fn recv_deadline(&self, deadline: Instant) -> Result<KeyEvent, channel::RecvTimeoutError> {
        self.rx.recv_deadline(deadline)
    }
}

/// A bounded mailbox and the sender that feeds it.
pub fn mailbox() -> (channel::Sender<KeyEvent>, Mailbox) {
    let (tx, rx) = channel::bounded(MAILBOX_CAPACITY);
    (tx, Mailbox::new(rx))
}

pub struct InputEventSource {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl InputEventSource {
    /// Starts delivering key events from the controlling terminal.
    /// Fails if stdin is not a terminal or raw mode cannot be enabled.
    pub fn register() -> io::Result<(InputEventSource, Mailbox)> {
        if !io::stdin().is_terminal() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stdin is not a terminal",
            ));
        }
        terminal::enable_raw_mode()?;

        let (tx, mailbox) = mailbox();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let spawned = thread::Builder::new()
            .name("proctop-input".into())
            .spawn(move || pump(tx, thread_stop));

        match spawned {
            Ok(handle) => {
                debug!("keyboard input registered");
                Ok((
                    InputEventSource {
                        stop,
                        handle: Some(handle),
                    },
                    mailbox,
                ))
            }
            Err(e) => {
                let _ = terminal::disable_raw_mode();
                Err(e)
            }
        }
    }

    /// Stops the reader thread and restores the terminal. Failures are
    /// ignored.
    pub fn unregister(self) {
        drop(self)
    }
}

impl Drop for InputEventSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let _ = terminal::disable_raw_mode();
        debug!("keyboard input unregistered");
    }
}

fn pump(tx: channel::Sender<KeyEvent>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!("keyboard poll failed: {e}");
                break;
            }
        }
        match event::read() {
            Ok(Event::Key(key)) => match tx.try_send(key) {
                Ok(()) => {}
                Err(channel::TrySendError::Full(key)) => {
                    trace!(?key, "mailbox full, key dropped");
                }
                Err(channel::TrySendError::Disconnected(_)) => break,
            },
            Ok(_) => {}
            Err(e) => {
                warn!("keyboard read failed: {e}");
                break;
            }
        }
    }
}
