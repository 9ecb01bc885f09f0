use std::path::PathBuf;

use clap::Parser;
use proctop::dashboard::control::{
    DEFAULT_ELEMENTS, DELAY_DETAIL, DELAY_FLOOR, DELAY_OVERVIEW,
};
use proctop::dashboard::{ClearMode, ElementCounts, LoopOptions};
use proctop::views::{DetailSettings, DEFAULT_NAME_WIDTH};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "proctop",
    version,
    about = "proctop - process monitoring for the command-line",
    after_help = "Keys: q/Esc quit. Overview: type a PID and press Enter. \
                  Detail: PgUp/PgDn (or -/+) fewer/more threads, </> faster/slower refresh, 1-9 set refresh."
)]
pub struct DashboardOpts {
    /// PID to inspect; starts directly in the detail view
    #[arg(value_name = "PID")]
    pub pid_arg: Option<u32>,

    /// PID to inspect (takes precedence over the positional PID)
    #[arg(short = 'p', long = "pid", value_name = "PID")]
    pub pid: Option<u32>,

    /// Delay between each output iteration, in seconds
    #[arg(short = 'd', long = "delay", value_parser = parse_delay)]
    pub delay: Option<f64>,

    /// Exit after n output iterations
    #[arg(
        short = 'n',
        long = "iteration",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub iterations: Option<u64>,

    /// Exit after the first output iteration (same as -n 1)
    #[arg(long)]
    pub once: bool,

    /// Width in columns for the console display
    #[arg(short = 'w', long = "width")]
    pub width: Option<usize>,

    /// Number of threads shown in the detail view
    #[arg(long = "threadlimit")]
    pub thread_limit: Option<usize>,

    /// Number of stack frames shown per thread in the detail view
    #[arg(long = "stacklimit")]
    pub stack_limit: Option<usize>,

    /// Show all threads in the detail view
    #[arg(long = "disable-threadlimit")]
    pub disable_thread_limit: bool,

    /// Displayed thread name length in the detail view
    #[arg(long = "threadnamewidth", default_value_t = DEFAULT_NAME_WIDTH)]
    pub thread_name_width: usize,

    /// Print every thread of PID with its stack, then exit
    #[arg(long = "thread-dump")]
    pub thread_dump: bool,

    /// Print diagnostic information about this host, then exit
    #[arg(long)]
    pub sysinfo: bool,

    /// Clear the screen with a form feed instead of an escape sequence
    #[arg(long = "alt-clear")]
    pub alt_clear: bool,

    /// Verbose logging (to stderr unless --log-file is given)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Write log output to this file
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Where the proc filesystem is mounted
    #[arg(long = "proc-root", default_value = "/proc", hide = true)]
    pub proc_root: PathBuf,
}

fn parse_delay(s: &str) -> Result<f64, String> {
    let delay: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if delay < DELAY_FLOOR || !delay.is_finite() {
        return Err(format!("delay cannot be set below {DELAY_FLOOR}"));
    }
    Ok(delay)
}

impl DashboardOpts {
    pub fn target_pid(&self) -> Option<u32> {
        self.pid.or(self.pid_arg)
    }

    pub fn max_iterations(&self) -> Option<u64> {
        self.iterations.or(self.once.then_some(1))
    }

    pub fn initial_delay(&self) -> f64 {
        match (self.delay, self.target_pid()) {
            (Some(delay), _) => delay,
            (None, Some(_)) => DELAY_DETAIL,
            (None, None) => DELAY_OVERVIEW,
        }
    }

    pub fn elements(&self) -> ElementCounts {
        ElementCounts::new(
            self.thread_limit.unwrap_or(DEFAULT_ELEMENTS),
            self.stack_limit.unwrap_or(DEFAULT_ELEMENTS),
        )
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            max_iterations: self.max_iterations(),
            clear: if self.alt_clear {
                ClearMode::FormFeed
            } else {
                ClearMode::Ansi
            },
            // An explicit delay survives the switch into a detail view.
            detail_delay: self.delay.is_none().then_some(DELAY_DETAIL),
        }
    }

    pub fn detail_settings(&self, terminal_width: Option<usize>) -> DetailSettings {
        DetailSettings {
            width: self.width.or(terminal_width),
            thread_limit: !self.disable_thread_limit,
            name_width: self.thread_name_width,
        }
    }
}
