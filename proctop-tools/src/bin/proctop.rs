// proctop
//
// Live process and thread dashboard for the local host.
//
// Build: cargo run --release --bin proctop -- [PID] [options]
// Quit:  q / Esc / Ctrl-C

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use crossterm::terminal;
use proctop::dashboard::{
    ActiveView, ControlState, Exit, HostInfo, InputEventSource, RenderLoop, StatusBar,
    ViewFactory,
};
use proctop::views::{write_sysinfo, ProcessViews, Sampler};
use proctop::ProcFs;
use proctop_tools::DashboardOpts;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Exit status when a mode needs a PID that was not given.
const EXIT_USAGE: u8 = 100;

/// Lines around the process table in the overview: status bar, blanks,
/// header, overflow note, annotation and prompt.
const OVERVIEW_CHROME: usize = 8;

fn init_logging(opts: &DashboardOpts) -> io::Result<()> {
    let default = if opts.verbose {
        "proctop=debug"
    } else {
        "proctop=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    match &opts.log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // The dashboard owns stdout; stderr only when asked for.
        None if opts.verbose => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

fn sysinfo(opts: &DashboardOpts) -> ExitCode {
    let mut out = io::stdout().lock();
    match write_sysinfo(&mut out, &HostInfo::detect(), &opts.proc_root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

fn thread_dump(opts: &DashboardOpts, procfs: ProcFs) -> ExitCode {
    let Some(pid) = opts.target_pid() else {
        eprintln!("ERROR: a PID is required for --thread-dump");
        return ExitCode::from(EXIT_USAGE);
    };
    let result = Sampler::attach(procfs, pid).and_then(|sampler| {
        let mut out = io::stdout().lock();
        sampler.thread_dump(&mut out)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: cannot dump threads of PID {pid}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn overview_rows() -> Option<usize> {
    if !io::stdout().is_terminal() {
        return None;
    }
    let (_, rows) = terminal::size().ok()?;
    Some((rows as usize).saturating_sub(OVERVIEW_CHROME).max(5))
}

fn terminal_width() -> Option<usize> {
    if !io::stdout().is_terminal() {
        return None;
    }
    terminal::size().ok().map(|(cols, _)| cols as usize)
}

fn run_dashboard(opts: &DashboardOpts, procfs: ProcFs) -> ExitCode {
    let status = StatusBar::default().with_loadavg_path(procfs.root().join("loadavg"));
    let views = ProcessViews::new(procfs, opts.detail_settings(terminal_width()));

    let initial = match opts.target_pid() {
        Some(pid) => match views.detail(pid) {
            Ok(detail) => ActiveView::Detail(detail),
            Err(e) => {
                eprintln!("ERROR: cannot monitor PID {pid}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ActiveView::Overview(Box::new(views.overview(overview_rows()))),
    };

    // A single frame needs no keyboard.
    let input = if opts.max_iterations() == Some(1) {
        None
    } else {
        match InputEventSource::register() {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!("keyboard input unavailable, running without it: {e}");
                None
            }
        }
    };

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        original_hook(panic_info);
    }));

    let control = ControlState::new(opts.initial_delay(), opts.elements());
    let out = BufWriter::new(io::stdout());
    let mut dashboard = RenderLoop::new(out, control, views, opts.loop_options())
        .with_status_bar(status);

    let source = match input {
        Some((source, mailbox)) => {
            dashboard = dashboard.with_mailbox(mailbox);
            Some(source)
        }
        None => None,
    };

    let result = dashboard.run(initial).and_then(|exit| {
        dashboard.into_output().flush()?;
        Ok(exit)
    });
    if let Some(source) = source {
        source.unregister();
    }

    match result {
        Ok(Exit::Fatal) => ExitCode::FAILURE,
        Ok(exit) => {
            debug!(?exit, "dashboard finished");
            println!();
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: terminal output failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let opts = DashboardOpts::parse();
    if let Err(e) = init_logging(&opts) {
        eprintln!("ERROR: cannot open log file: {e}");
        return ExitCode::FAILURE;
    }
    debug!(?opts, "starting");

    let procfs = ProcFs::with_root(&opts.proc_root);
    if opts.sysinfo {
        return sysinfo(&opts);
    }
    if opts.thread_dump {
        return thread_dump(&opts, procfs);
    }
    run_dashboard(&opts, procfs)
}
