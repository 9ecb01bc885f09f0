use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::Sender;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use proctop::dashboard::control::{DELAY_DETAIL, MIN_ELEMENTS};
use proctop::dashboard::{
    mailbox, ActiveView, ControlState, Detail, ElementCounts, Exit, Frame, HostInfo,
    LoopOptions, Overview, RenderLoop, StatusBar, View, ViewFactory, ViewKind,
};
use proctop::{SourceError, ViewError};

#[derive(Clone, Default)]
struct Counters {
    overview_renders: Arc<AtomicUsize>,
    detail_renders: Arc<AtomicUsize>,
    dismissed: Arc<AtomicUsize>,
    created: Arc<Mutex<Vec<u32>>>,
}

enum Failure {
    None,
    Unavailable,
    FirstRender,
}

struct ScriptedOverview {
    known: BTreeSet<u32>,
    counters: Counters,
    failure: Failure,
}

impl View for ScriptedOverview {
    fn render_body(&mut self, frame: &mut Frame<'_>, _: &ControlState) -> Result<(), ViewError> {
        let n = self.counters.overview_renders.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Failure::Unavailable => return Err(ViewError::Unavailable("/proc".into())),
            Failure::FirstRender if n == 0 => {
                return Err(SourceError::NoSuchProcess(1).into());
            }
            _ => {}
        }
        frame.line("overview body")?;
        Ok(())
    }

    fn render_footer(
        &mut self,
        frame: &mut Frame<'_>,
        control: &ControlState,
    ) -> Result<(), ViewError> {
        if let Some(note) = control.annotation() {
            frame.line(note)?;
        }
        frame.line(format_args!("pid> {}", control.pending_digits()))?;
        Ok(())
    }
}

impl Overview for ScriptedOverview {
    fn known_pids(&self) -> &BTreeSet<u32> {
        &self.known
    }

    fn dismiss(&mut self) {
        self.counters.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptedDetail {
    pid: u32,
    counters: Counters,
    exit_after_first: bool,
    rendered: bool,
}

impl View for ScriptedDetail {
    fn render_body(&mut self, frame: &mut Frame<'_>, control: &ControlState) -> Result<(), ViewError> {
        self.counters.detail_renders.fetch_add(1, Ordering::SeqCst);
        self.rendered = true;
        frame.line(format_args!(
            "detail {} threads={} frames={}",
            self.pid,
            control.elements().threads,
            control.elements().frames
        ))?;
        Ok(())
    }

    fn render_footer(&mut self, _: &mut Frame<'_>, _: &ControlState) -> Result<(), ViewError> {
        Ok(())
    }

    fn should_exit(&self) -> bool {
        self.exit_after_first && self.rendered
    }
}

impl Detail for ScriptedDetail {
    fn pid(&self) -> u32 {
        self.pid
    }
}

struct Factory {
    counters: Counters,
    refuse: Arc<AtomicBool>,
}

impl ViewFactory for Factory {
    fn detail(&self, pid: u32) -> Result<Box<dyn Detail>, ViewError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SourceError::NoSuchProcess(pid).into());
        }
        self.counters.created.lock().unwrap().push(pid);
        Ok(Box::new(ScriptedDetail {
            pid,
            counters: self.counters.clone(),
            exit_after_first: false,
            rendered: false,
        }))
    }
}

fn status_bar() -> StatusBar {
    let host = HostInfo {
        arch: "x86_64",
        cpus: 4,
        os: "linux",
        release: None,
    };
    StatusBar::new(host).with_loadavg_path("/nonexistent/loadavg")
}

fn overview(known: &[u32], counters: &Counters, failure: Failure) -> ActiveView {
    ActiveView::Overview(Box::new(ScriptedOverview {
        known: known.iter().copied().collect(),
        counters: counters.clone(),
        failure,
    }))
}

fn dashboard(
    delay: f64,
    elements: ElementCounts,
    max_iterations: Option<u64>,
    counters: &Counters,
) -> RenderLoop<Vec<u8>, Factory> {
    let options = LoopOptions {
        max_iterations,
        ..LoopOptions::default()
    };
    let factory = Factory {
        counters: counters.clone(),
        refuse: Arc::new(AtomicBool::new(false)),
    };
    RenderLoop::new(Vec::new(), ControlState::new(delay, elements), factory, options)
        .with_status_bar(status_bar())
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(tx: &Sender<KeyEvent>, text: &str) {
    for c in text.chars() {
        tx.send(key(KeyCode::Char(c))).unwrap();
    }
}

fn output(dash: &RenderLoop<Vec<u8>, Factory>) -> String {
    String::from_utf8_lossy(dash.output()).into_owned()
}

const CLEAR_SCREEN: &str = "\x1b[2J";

#[test]
fn single_shot_renders_once_without_clearing() {
    let counters = Counters::default();
    let mut dash = dashboard(9.0, ElementCounts::default(), Some(1), &counters);

    let start = Instant::now();
    let exit = dash.run(overview(&[1], &counters, Failure::None)).unwrap();

    assert_eq!(exit, Exit::IterationsExhausted);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(counters.overview_renders.load(Ordering::SeqCst), 1);
    let out = output(&dash);
    assert!(out.starts_with(" proctop "));
    assert!(!out.contains(CLEAR_SCREEN));
}

#[test]
fn bounded_run_clears_every_frame() {
    let counters = Counters::default();
    let mut dash = dashboard(0.1, ElementCounts::default(), Some(3), &counters);

    let exit = dash.run(overview(&[1], &counters, Failure::None)).unwrap();

    assert_eq!(exit, Exit::IterationsExhausted);
    assert_eq!(counters.overview_renders.load(Ordering::SeqCst), 3);
    assert_eq!(output(&dash).matches(CLEAR_SCREEN).count(), 3);
}

#[test]
fn typing_a_known_pid_opens_its_detail_view() {
    let counters = Counters::default();
    let (tx, mailbox) = mailbox();
    type_text(&tx, "101");
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();

    let mut dash = dashboard(5.5, ElementCounts::default(), Some(2), &counters)
        .with_mailbox(mailbox);
    let exit = dash.run(overview(&[101, 202], &counters, Failure::None)).unwrap();

    assert_eq!(exit, Exit::IterationsExhausted);
    assert_eq!(counters.dismissed.load(Ordering::SeqCst), 1);
    assert_eq!(*counters.created.lock().unwrap(), vec![101]);
    assert_eq!(counters.overview_renders.load(Ordering::SeqCst), 0);
    assert_eq!(counters.detail_renders.load(Ordering::SeqCst), 2);
    assert_eq!(dash.control().delay_secs(), DELAY_DETAIL);
    assert!(output(&dash).contains("detail 101"));
}

#[test]
fn unknown_pid_keeps_the_overview() {
    let counters = Counters::default();
    let (tx, mailbox) = mailbox();
    type_text(&tx, "99");
    tx.send(key(KeyCode::Enter)).unwrap();

    let mut dash = dashboard(5.5, ElementCounts::default(), Some(1), &counters)
        .with_mailbox(mailbox);
    dash.run(overview(&[101, 202], &counters, Failure::None)).unwrap();

    assert_eq!(counters.overview_renders.load(Ordering::SeqCst), 1);
    assert_eq!(counters.dismissed.load(Ordering::SeqCst), 0);
    assert!(dash.control().pending_digits().is_empty());
    let note = dash.control().annotation().unwrap();
    assert!(note.contains("99"));
    assert!(output(&dash).contains(note));
}

#[test]
fn factory_failure_is_annotated() {
    let counters = Counters::default();
    let (tx, mailbox) = mailbox();
    type_text(&tx, "101");
    tx.send(key(KeyCode::Enter)).unwrap();

    let factory = Factory {
        counters: counters.clone(),
        refuse: Arc::new(AtomicBool::new(true)),
    };
    let options = LoopOptions {
        max_iterations: Some(1),
        ..LoopOptions::default()
    };
    let mut dash = RenderLoop::new(Vec::new(), ControlState::default(), factory, options)
        .with_status_bar(status_bar())
        .with_mailbox(mailbox);
    dash.run(overview(&[101], &counters, Failure::None)).unwrap();

    assert_eq!(counters.overview_renders.load(Ordering::SeqCst), 1);
    assert_eq!(counters.dismissed.load(Ordering::SeqCst), 0);
    assert!(dash
        .control()
        .annotation()
        .unwrap()
        .contains("could not be opened"));
}

#[test]
fn decrease_at_minimum_stays_at_minimum() {
    let counters = Counters::default();
    let (tx, mailbox) = mailbox();
    for _ in 0..5 {
        tx.send(key(KeyCode::PageUp)).unwrap();
    }

    let detail = ActiveView::Detail(Box::new(ScriptedDetail {
        pid: 7,
        counters: counters.clone(),
        exit_after_first: false,
        rendered: false,
    }));
    let elements = ElementCounts::new(MIN_ELEMENTS, MIN_ELEMENTS);
    let mut dash = dashboard(3.0, elements, Some(1), &counters).with_mailbox(mailbox);
    dash.run(detail).unwrap();

    assert_eq!(dash.control().elements(), elements);
    assert!(output(&dash).contains("detail 7 threads=3 frames=3"));
}

#[test]
fn quit_interrupts_the_wait() {
    let counters = Counters::default();
    let (tx, mailbox) = mailbox();
    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        tx.send(key(KeyCode::Char('q'))).unwrap();
    });

    let mut dash = dashboard(9.0, ElementCounts::default(), None, &counters)
        .with_mailbox(mailbox);
    let start = Instant::now();
    let exit = dash.run(overview(&[1], &counters, Failure::None)).unwrap();
    sender.join().unwrap();

    assert_eq!(exit, Exit::Quit);
    assert!(start.elapsed() < Duration::from_secs(5));
    // First two frames are back to back, the third would follow the wait.
    assert_eq!(counters.overview_renders.load(Ordering::SeqCst), 2);
    assert!(dash.control().exit_requested());
    assert!(output(&dash).ends_with("\x1b[2K\x1b[1G"));
}

#[test]
fn view_switch_cuts_the_wait_short() {
    let counters = Counters::default();
    let (tx, mailbox) = mailbox();
    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        type_text(&tx, "202");
        tx.send(key(KeyCode::Enter)).unwrap();
        thread::sleep(Duration::from_millis(300));
        tx.send(key(KeyCode::Esc)).unwrap();
    });

    let mut dash = dashboard(9.0, ElementCounts::default(), None, &counters)
        .with_mailbox(mailbox);
    let start = Instant::now();
    let exit = dash.run(overview(&[101, 202], &counters, Failure::None)).unwrap();
    sender.join().unwrap();

    assert_eq!(exit, Exit::Quit);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(counters.detail_renders.load(Ordering::SeqCst), 1);
    assert!(output(&dash).contains("detail 202"));
}

#[test]
fn missing_runtime_is_fatal() {
    let counters = Counters::default();
    let mut dash = dashboard(1.0, ElementCounts::default(), None, &counters);
    let exit = dash.run(overview(&[], &counters, Failure::Unavailable)).unwrap();
    assert_eq!(exit, Exit::Fatal);
    assert_eq!(counters.overview_renders.load(Ordering::SeqCst), 1);
}

#[test]
fn render_errors_are_shown_and_the_loop_goes_on() {
    let counters = Counters::default();
    let mut dash = dashboard(1.0, ElementCounts::default(), Some(2), &counters);
    let exit = dash.run(overview(&[], &counters, Failure::FirstRender)).unwrap();

    assert_eq!(exit, Exit::IterationsExhausted);
    let out = output(&dash);
    assert!(out.contains(" [!] no such process: 1\r\n"));
    assert!(out.contains("overview body"));
}

#[test]
fn finished_view_ends_the_run() {
    let counters = Counters::default();
    let detail = ActiveView::Detail(Box::new(ScriptedDetail {
        pid: 9,
        counters: counters.clone(),
        exit_after_first: true,
        rendered: false,
    }));
    assert_eq!(detail.kind(), ViewKind::Detail);

    let mut dash = dashboard(1.0, ElementCounts::default(), None, &counters);
    assert_eq!(dash.run(detail).unwrap(), Exit::ViewExited);
    assert_eq!(counters.detail_renders.load(Ordering::SeqCst), 1);
}

#[test]
fn zero_budget_means_unbounded() {
    let counters = Counters::default();
    let detail = ActiveView::Detail(Box::new(ScriptedDetail {
        pid: 9,
        counters: counters.clone(),
        exit_after_first: true,
        rendered: false,
    }));

    let mut dash = dashboard(1.0, ElementCounts::default(), Some(0), &counters);
    assert_eq!(dash.run(detail).unwrap(), Exit::ViewExited);
    assert_eq!(counters.detail_renders.load(Ordering::SeqCst), 1);
    assert!(output(&dash).starts_with(CLEAR_SCREEN));
}
