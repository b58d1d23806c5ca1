use crate::github::Progress;
use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

type StatusCallback = Box<dyn Fn() -> (u64, u64, String) + Send + Sync>;

const TICK: Duration = Duration::from_millis(100);
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";

/// How the current phase is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Known amount of work: a bar with a position
    Counted,

    /// Unknown amount of work: a spinner with the time spent so far
    Open,
}

struct Status {
    mode: Mode,
    started: Instant,
    describe: StatusCallback,
}

struct Shared {
    show_at: Instant,
    shown: AtomicBool,
    status: Mutex<Status>,
}

impl Debug for Shared {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Shared")
            .field("show_at", &self.show_at)
            .field("shown", &self.shown)
            .finish_non_exhaustive()
    }
}

/// Fetch progress on stderr, hidden until the fetch has run for a while.
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
    shared: Arc<Shared>,
    ticker: Arc<JoinHandle<()>>,
    use_colors: bool,
}

impl ProgressReporter {
    /// Create a reporter that starts drawing once `delay` has passed.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(delay: Duration, use_colors: bool) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        let now = Instant::now();

        let shared = Arc::new(Shared {
            show_at: now + delay,
            shown: AtomicBool::new(false),
            status: Mutex::new(Status {
                mode: Mode::Open,
                started: now,
                describe: Box::new(|| (0, 0, String::new())),
            }),
        });

        Self {
            ticker: Arc::new(tokio::spawn(tick(bar.clone(), Arc::clone(&shared)))),
            bar,
            shared,
            use_colors,
        }
    }

    fn switch_to(&self, mode: Mode, describe: StatusCallback) {
        {
            let mut status = self.shared.status.lock().expect("lock poisoned");
            status.mode = mode;
            status.started = Instant::now();
            status.describe = describe;
        }

        let prefix = if self.use_colors { "{prefix:>10.bold.cyan}" } else { "{prefix:>10}" };
        let style = match mode {
            Mode::Counted => ProgressStyle::default_bar()
                .template(&format!("{prefix} [{{bar:30}}] {{msg}}"))
                .expect("progress templates are valid")
                .progress_chars("=> "),
            Mode::Open => ProgressStyle::default_spinner()
                .template(&format!("{prefix} {{spinner}} {{msg}}"))
                .expect("progress templates are valid")
                .tick_chars(SPINNER_CHARS),
        };

        if mode == Mode::Counted {
            self.bar.set_length(0);
            self.bar.set_position(0);
        }
        self.bar.set_style(style);
    }
}

impl Progress for ProgressReporter {
    fn set_phase(&self, phase: &str) {
        self.bar.set_prefix(phase.to_string());
    }

    fn set_determinate(&self, callback: Box<dyn Fn() -> (u64, u64, String) + Send + Sync + 'static>) {
        self.switch_to(Mode::Counted, callback);
    }

    fn set_indeterminate(&self, callback: Box<dyn Fn() -> String + Send + Sync + 'static>) {
        self.switch_to(Mode::Open, Box::new(move || (0, 0, callback())));
    }

    fn println(&self, msg: &str) {
        self.bar.suspend(|| eprintln!("{msg}"));
    }

    fn done(&self) {
        self.ticker.abort();
        if self.shared.shown.load(Ordering::Relaxed) {
            self.bar.finish_and_clear();
        }
    }
}

impl Debug for ProgressReporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("bar", &self.bar)
            .field("shared", &self.shared)
            .field("use_colors", &self.use_colors)
            .finish_non_exhaustive()
    }
}

/// Redraw the bar from the current status callback until aborted.
async fn tick(bar: ProgressBar, shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(TICK);
    #[expect(clippy::infinite_loop, reason = "task runs until aborted")]
    loop {
        let _ = interval.tick().await;

        if !shared.shown.load(Ordering::Relaxed) {
            if Instant::now() < shared.show_at {
                continue;
            }
            shared.shown.store(true, Ordering::Relaxed);
            bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        }

        let (mode, elapsed, (total, done, message)) = {
            let status = shared.status.lock().expect("lock poisoned");
            (status.mode, status.started.elapsed(), (status.describe)())
        };

        match mode {
            Mode::Counted => {
                if total > 0 {
                    bar.set_length(total);
                    bar.set_position(done);
                }
                bar.set_message(message);
            }
            Mode::Open => {
                bar.tick();
                bar.set_message(format!("{}s: {message}", elapsed.as_secs()));
            }
        }
    }
}
